//! Windows has no POSIX access-mode bits, so readable/writable/executable
//! report `true` unconditionally. File identity uses the extended
//! per-volume file id on Windows 8+, falling back to the legacy by-handle
//! file index (needed on FAT32 volumes, which don't support the extended
//! query).

use std::{fs::OpenOptions, io, os::windows::io::AsRawHandle, path::Path};
use windows_sys::Win32::{
    Foundation::HANDLE,
    Storage::FileSystem::{
        GetDiskFreeSpaceExW, GetFileInformationByHandle, GetFileInformationByHandleEx,
        BY_HANDLE_FILE_INFORMATION, FILE_ID_INFO, FileIdInfo,
    },
};

pub fn is_readable(_path: &Path) -> bool {
    true
}

pub fn is_writable(_path: &Path) -> bool {
    true
}

pub fn is_executable(_path: &Path) -> bool {
    true
}

pub fn num_hard_links(_path: &Path) -> u64 {
    0
}

fn file_id_from_handle_ex(handle: HANDLE) -> Option<String> {
    let mut info: FILE_ID_INFO = unsafe { std::mem::zeroed() };
    let ok = unsafe {
        GetFileInformationByHandleEx(
            handle,
            FileIdInfo,
            &mut info as *mut _ as *mut _,
            std::mem::size_of::<FILE_ID_INFO>() as u32,
        )
    };
    if ok == 0 {
        return None;
    }
    let id_hex = info
        .FileId
        .Identifier
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>();
    Some(format!("0x{:x}:{}", info.VolumeSerialNumber, id_hex))
}

fn file_id_from_handle_legacy(handle: HANDLE) -> Option<String> {
    let mut info: BY_HANDLE_FILE_INFORMATION = unsafe { std::mem::zeroed() };
    let ok = unsafe { GetFileInformationByHandle(handle, &mut info) };
    if ok == 0 {
        return None;
    }
    Some(format!(
        "{:x}:{:08x}{:08x}",
        info.dwVolumeSerialNumber, info.nFileIndexHigh, info.nFileIndexLow
    ))
}

/// `"0x{volume-serial:x}:{128-bit file-id:x}"` on Windows ≥ 8; falls back
/// to `"{volume-serial:x}:{index-high:08x}{index-low:08x}"` when the
/// extended query fails (e.g. FAT32).
pub fn file_id(path: &Path) -> String {
    let file = match OpenOptions::new().read(true).open(path) {
        Ok(f) => f,
        Err(_) => return String::new(),
    };
    let handle = file.as_raw_handle() as HANDLE;
    file_id_from_handle_ex(handle)
        .or_else(|| file_id_from_handle_legacy(handle))
        .unwrap_or_default()
}

pub fn free_space(path: &Path) -> io::Result<u64> {
    let mut wide: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();
    let mut free_bytes: u64 = 0;
    let ok = unsafe {
        GetDiskFreeSpaceExW(wide.as_mut_ptr(), &mut free_bytes, std::ptr::null_mut(), std::ptr::null_mut())
    };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(free_bytes)
}

use std::os::windows::ffi::OsStrExt;

/// Windows has no SIGTERM/SIGINT; `terminate` and `kill` both map to
/// `TerminateProcess`, and `interrupt` is approximated the same way since
/// there is no portable equivalent without attaching a console control
/// handler (documented REDESIGN deviation, see DESIGN.md).
pub fn send_signal(pid: i64, _kind: agent_protocol::SignalKind) -> io::Result<()> {
    use windows_sys::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};
    unsafe {
        let handle = OpenProcess(PROCESS_TERMINATE, 0, pid as u32);
        if handle == 0 {
            return Err(io::Error::last_os_error());
        }
        let ok = TerminateProcess(handle, 1);
        windows_sys::Win32::Foundation::CloseHandle(handle);
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}
