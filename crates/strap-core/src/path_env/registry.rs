//! Registry-backed PATH store for Windows hosts.

use super::{PathStore, PathSyntax, RegistrationError, Scope};
use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

use windows::core::PCWSTR;
use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, LPARAM, WPARAM};
use windows::Win32::System::Registry::{
    RegCloseKey, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW, HKEY, HKEY_CURRENT_USER,
    HKEY_LOCAL_MACHINE, KEY_READ, KEY_WRITE, REG_EXPAND_SZ, REG_SAM_FLAGS, REG_VALUE_TYPE,
};
use windows::Win32::UI::WindowsAndMessaging::{
    SendMessageTimeoutW, HWND_BROADCAST, SMTO_ABORTIFHUNG, WM_SETTINGCHANGE,
};

const USER_KEY: &str = "Environment";
const MACHINE_KEY: &str = r"SYSTEM\CurrentControlSet\Control\Session Manager\Environment";
const VALUE_NAME: &str = "Path";

/// Reads and writes `Path` under `HKCU\Environment` or the machine environment key.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryPathStore;

impl RegistryPathStore {
    pub fn new() -> Self {
        Self
    }
}

/// RAII wrapper for an open registry key.
struct RegistryHandle(HKEY);

impl Drop for RegistryHandle {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            unsafe {
                let _ = RegCloseKey(self.0);
            }
        }
    }
}

fn to_wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

fn location(scope: Scope) -> (HKEY, &'static str, &'static str) {
    match scope {
        Scope::User => (HKEY_CURRENT_USER, "HKCU", USER_KEY),
        Scope::Machine => (HKEY_LOCAL_MACHINE, "HKLM", MACHINE_KEY),
    }
}

fn describe(scope: Scope) -> String {
    let (_, hive, key) = location(scope);
    format!(r"{hive}\{key}\{VALUE_NAME}")
}

fn open_key(scope: Scope, access: REG_SAM_FLAGS) -> windows::core::Result<RegistryHandle> {
    let (root, _, key) = location(scope);
    let key = to_wide(key);
    let mut handle = HKEY::default();
    unsafe {
        RegOpenKeyExW(root, PCWSTR::from_raw(key.as_ptr()), None, access, &mut handle).ok()?;
    }
    Ok(RegistryHandle(handle))
}

/// Tell running Explorer/shells that the environment changed.
fn broadcast_environment_change() {
    let area = to_wide("Environment");
    unsafe {
        let _ = SendMessageTimeoutW(
            HWND_BROADCAST,
            WM_SETTINGCHANGE,
            WPARAM(0),
            LPARAM(area.as_ptr() as isize),
            SMTO_ABORTIFHUNG,
            5000,
            None,
        );
    }
}

impl PathStore for RegistryPathStore {
    fn get(&self, scope: Scope) -> Result<String, RegistrationError> {
        let read_err = |reason: String| RegistrationError::Read {
            scope,
            location: describe(scope),
            reason,
        };
        let key = open_key(scope, KEY_READ).map_err(|e| read_err(e.to_string()))?;
        let name = to_wide(VALUE_NAME);

        let mut kind = REG_VALUE_TYPE::default();
        let mut size: u32 = 0;
        let status = unsafe {
            RegQueryValueExW(
                key.0,
                PCWSTR::from_raw(name.as_ptr()),
                None,
                Some(&mut kind),
                None,
                Some(&mut size),
            )
        };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(String::new());
        }
        status.ok().map_err(|e| read_err(e.to_string()))?;

        let mut buf: Vec<u16> = vec![0; (size as usize).div_ceil(2)];
        let status = unsafe {
            RegQueryValueExW(
                key.0,
                PCWSTR::from_raw(name.as_ptr()),
                None,
                Some(&mut kind),
                Some(buf.as_mut_ptr() as *mut u8),
                Some(&mut size),
            )
        };
        status.ok().map_err(|e| read_err(e.to_string()))?;

        let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
        String::from_utf16(&buf[..len]).map_err(|e| read_err(e.to_string()))
    }

    fn set(&self, scope: Scope, value: &str) -> Result<(), RegistrationError> {
        let write_err = |reason: String| RegistrationError::Write {
            scope,
            location: describe(scope),
            reason,
        };
        let key = open_key(scope, KEY_WRITE).map_err(|e| write_err(e.to_string()))?;
        let name = to_wide(VALUE_NAME);
        let data: Vec<u8> = to_wide(value)
            .into_iter()
            .flat_map(|c| c.to_le_bytes())
            .collect();

        // REG_EXPAND_SZ keeps %USERPROFILE%-style entries expanding for new sessions.
        unsafe {
            RegSetValueExW(
                key.0,
                PCWSTR::from_raw(name.as_ptr()),
                None,
                REG_EXPAND_SZ,
                Some(&data),
            )
            .ok()
            .map_err(|e| write_err(e.to_string()))?;
        }
        drop(key);
        broadcast_environment_change();
        Ok(())
    }

    fn syntax(&self) -> PathSyntax {
        PathSyntax::WINDOWS
    }
}
