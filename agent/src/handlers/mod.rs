pub mod exec;
pub mod fileops;
pub mod find;
pub mod is;
pub mod readfile;
pub mod signal;
pub mod stat;
pub mod writefile;
