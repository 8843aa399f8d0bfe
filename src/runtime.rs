//! Loads the target shared object with `dlopen` and resolves symbols in it
//! with `dlsym`, mirroring the original's `Runtime::loadUserCode`/
//! `findSymbol`/`run`. `libc` is the same crate `Noratrieb-uwuwind` reaches
//! for to do exactly this kind of raw dynamic-loader plumbing.

use std::ffi::{CStr, CString};
use std::os::raw::{c_int, c_void};
use std::path::Path;

use crate::error::{CedoError, Result};

pub struct Runtime {
    handle: *mut c_void,
}

impl Runtime {
    pub fn load_user_code(path: &Path) -> Result<Runtime> {
        let c_path = CString::new(path.as_os_str().to_string_lossy().into_owned())
            .map_err(|e| CedoError::Other(e.to_string()))?;
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            return Err(CedoError::Other(format!(
                "couldn't dlopen '{}'. Reason: {}",
                path.display(),
                dlerror_message()
            )));
        }
        Ok(Runtime { handle })
    }

    /// Returns the live address of `name` in the loaded shared object, or
    /// `None` if the dynamic loader couldn't find it.
    pub fn find_symbol(&self, name: &str) -> Option<usize> {
        let c_name = CString::new(name).ok()?;
        let sym = unsafe { libc::dlsym(self.handle, c_name.as_ptr()) };
        (!sym.is_null()).then_some(sym as usize)
    }

    /// Finds and calls `main(argc, argv)` in the loaded object, returning
    /// its exit code.
    pub fn run_main(&self, args: &[String]) -> Result<i32> {
        let main_ptr = self.find_symbol("main").ok_or_else(|| {
            CedoError::Other(format!(
                "couldn't find symbol \"main\". Reason: {}",
                dlerror_message()
            ))
        })?;

        let c_args: Vec<CString> = args
            .iter()
            .map(|a| CString::new(a.as_str()).unwrap_or_default())
            .collect();
        let mut argv: Vec<*mut std::os::raw::c_char> =
            c_args.iter().map(|a| a.as_ptr() as *mut std::os::raw::c_char).collect();
        argv.push(std::ptr::null_mut());

        type MainFn = unsafe extern "C" fn(c_int, *mut *mut std::os::raw::c_char) -> c_int;
        let main_fn: MainFn = unsafe { std::mem::transmute(main_ptr) };
        Ok(unsafe { main_fn(c_args.len() as c_int, argv.as_mut_ptr()) })
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        unsafe {
            libc::dlclose(self.handle);
        }
    }
}

fn dlerror_message() -> String {
    let ptr = unsafe { libc::dlerror() };
    if ptr.is_null() {
        "unknown error".to_string()
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }
}
