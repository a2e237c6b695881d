//! [`WindowSystem`] sobre a API Win32 (user32 / gdi32).

use crate::visibility::{Rect, ShowState, WindowId, WindowSystem};
use windows::Win32::Foundation::{HWND, RECT};
use windows::Win32::Graphics::Gdi::{GetMonitorInfoW, MONITOR_DEFAULTTONEAREST, MONITORINFO, MonitorFromWindow};
use windows::Win32::UI::WindowsAndMessaging::{
    GetClassNameW, GetForegroundWindow, GetShellWindow, GetWindowPlacement, GetWindowRect,
    SW_SHOWMAXIMIZED, SW_SHOWMINIMIZED, WINDOWPLACEMENT,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct Win32WindowSystem;

fn hwnd(id: WindowId) -> HWND {
    HWND(id as *mut core::ffi::c_void)
}

fn window_id(hwnd: HWND) -> Option<WindowId> {
    if hwnd.0.is_null() {
        None
    } else {
        Some(hwnd.0 as WindowId)
    }
}

fn to_rect(r: RECT) -> Rect {
    Rect::new(r.left, r.top, r.right, r.bottom)
}

impl WindowSystem for Win32WindowSystem {
    fn foreground_window(&self) -> Option<WindowId> {
        window_id(unsafe { GetForegroundWindow() })
    }

    fn shell_window(&self) -> Option<WindowId> {
        window_id(unsafe { GetShellWindow() })
    }

    fn class_name(&self, window: WindowId) -> Option<String> {
        let mut buf = [0u16; 256];
        let len = unsafe { GetClassNameW(hwnd(window), &mut buf) };
        if len <= 0 {
            return None;
        }
        Some(String::from_utf16_lossy(&buf[..len as usize]))
    }

    fn show_state(&self, window: WindowId) -> Option<ShowState> {
        let mut placement = WINDOWPLACEMENT {
            length: std::mem::size_of::<WINDOWPLACEMENT>() as u32,
            ..Default::default()
        };
        unsafe { GetWindowPlacement(hwnd(window), &mut placement) }.ok()?;

        let state = if placement.showCmd == SW_SHOWMINIMIZED.0 as u32 {
            ShowState::Minimized
        } else if placement.showCmd == SW_SHOWMAXIMIZED.0 as u32 {
            ShowState::Maximized
        } else {
            ShowState::Normal
        };
        Some(state)
    }

    fn window_rect(&self, window: WindowId) -> Option<Rect> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd(window), &mut rect) }.ok()?;
        Some(to_rect(rect))
    }

    fn monitor_rect(&self, window: WindowId) -> Option<Rect> {
        unsafe {
            let monitor = MonitorFromWindow(hwnd(window), MONITOR_DEFAULTTONEAREST);
            if monitor.0.is_null() {
                return None;
            }
            let mut info = MONITORINFO {
                cbSize: std::mem::size_of::<MONITORINFO>() as u32,
                ..Default::default()
            };
            if GetMonitorInfoW(monitor, &mut info).as_bool() {
                Some(to_rect(info.rcMonitor))
            } else {
                None
            }
        }
    }
}
