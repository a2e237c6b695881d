//! Classificação da janela em primeiro plano.
//!
//! Decide se outra janela já ocupa a tela inteira (maximizada ou fullscreen
//! sem borda) e, portanto, se o overlay deve ser escondido. Qualquer falha
//! de consulta resulta em "não ocupada": é preferível mostrar o overlay do
//! que escondê-lo por engano.

/// Handle opaco de janela do sistema.
pub type WindowId = isize;

/// Folga, em unidades lógicas, nas quatro bordas.
pub const EDGE_TOLERANCE: i32 = 5;

/// Classes das janelas do desktop (papel de parede / ícones).
pub const DESKTOP_CLASSES: [&str; 2] = ["Progman", "WorkerW"];

/// Retângulo em coordenadas de tela.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    #[cfg(any(windows, test))]
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// `true` se `self` cobre `screen` com a folga dada em cada borda.
    pub fn covers(&self, screen: &Rect, tolerance: i32) -> bool {
        self.left <= screen.left + tolerance
            && self.top <= screen.top + tolerance
            && self.right >= screen.right - tolerance
            && self.bottom >= screen.bottom - tolerance
    }
}

/// Estado de exibição de uma janela.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(windows), allow(dead_code))]
pub enum ShowState {
    Normal,
    Minimized,
    Maximized,
}

/// Consultas ao gerenciador de janelas. `None` = consulta falhou.
pub trait WindowSystem {
    fn foreground_window(&self) -> Option<WindowId>;
    fn shell_window(&self) -> Option<WindowId>;
    fn class_name(&self, window: WindowId) -> Option<String>;
    fn show_state(&self, window: WindowId) -> Option<ShowState>;
    fn window_rect(&self, window: WindowId) -> Option<Rect>;
    /// Retângulo do monitor que contém a janela.
    fn monitor_rect(&self, window: WindowId) -> Option<Rect>;
}

/// `true` se a janela em primeiro plano ocupa a tela inteira.
///
/// `own` é a janela do próprio overlay, que nunca conta.
pub fn foreground_occupies_screen<W: WindowSystem + ?Sized>(ws: &W, own: Option<WindowId>) -> bool {
    let Some(fg) = ws.foreground_window() else {
        return false;
    };

    if Some(fg) == ws.shell_window() || Some(fg) == own {
        return false;
    }
    if let Some(class) = ws.class_name(fg) {
        if DESKTOP_CLASSES.contains(&class.as_str()) {
            return false;
        }
    }

    match ws.show_state(fg) {
        None | Some(ShowState::Minimized) => return false,
        Some(ShowState::Maximized) => return true,
        Some(ShowState::Normal) => {}
    }

    match (ws.window_rect(fg), ws.monitor_rect(fg)) {
        (Some(window), Some(screen)) => window.covers(&screen, EDGE_TOLERANCE),
        _ => false,
    }
}

/// Sem gerenciador de janelas: nunca há janela em primeiro plano.
#[cfg(any(not(windows), test))]
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessWindowSystem;

#[cfg(any(not(windows), test))]
impl WindowSystem for HeadlessWindowSystem {
    fn foreground_window(&self) -> Option<WindowId> {
        None
    }
    fn shell_window(&self) -> Option<WindowId> {
        None
    }
    fn class_name(&self, _window: WindowId) -> Option<String> {
        None
    }
    fn show_state(&self, _window: WindowId) -> Option<ShowState> {
        None
    }
    fn window_rect(&self, _window: WindowId) -> Option<Rect> {
        None
    }
    fn monitor_rect(&self, _window: WindowId) -> Option<Rect> {
        None
    }
}

/// Implementação nativa da plataforma atual.
pub fn native() -> Box<dyn WindowSystem> {
    #[cfg(windows)]
    {
        Box::new(crate::win32::Win32WindowSystem)
    }
    #[cfg(not(windows))]
    {
        Box::new(HeadlessWindowSystem)
    }
}
