//! Input injection boundary and its enigo-backed implementation.

use std::{thread, time::Duration};

use enigo::{Key, KeyboardControllable, MouseButton, MouseControllable};

use crate::{error::InjectorError, motion};

/// Modifier held for a key chord.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modifier {
    Control,
    Command,
}

impl Modifier {
    /// The modifier the platform uses for clipboard shortcuts.
    pub fn clipboard() -> Self {
        if cfg!(target_os = "macos") {
            Modifier::Command
        } else {
            Modifier::Control
        }
    }
}

/// OS-level pointer and keyboard injection.
pub trait Injector: Send {
    fn move_to(&mut self, x: i32, y: i32, duration: Duration) -> Result<(), InjectorError>;
    fn click(&mut self) -> Result<(), InjectorError>;
    fn double_click(&mut self) -> Result<(), InjectorError>;
    fn hotkey(&mut self, modifier: Modifier, key: char) -> Result<(), InjectorError>;
    fn position(&self) -> (i32, i32);

    fn copy(&mut self) -> Result<(), InjectorError> {
        self.hotkey(Modifier::clipboard(), 'c')
    }

    fn paste(&mut self) -> Result<(), InjectorError> {
        self.hotkey(Modifier::clipboard(), 'v')
    }
}

/// True when `pos` lies on one of the four corners of a `width` x `height` screen.
pub fn on_screen_corner(pos: (i32, i32), (width, height): (i32, i32)) -> bool {
    let xs = [0, width - 1];
    let ys = [0, height - 1];
    xs.contains(&pos.0) && ys.contains(&pos.1)
}

/// Walks `points`, pausing between them. Stops at the first step that fails.
pub fn glide<F>(points: &[(i32, i32)], pause: Duration, mut step: F) -> Result<(), InjectorError>
where
    F: FnMut(i32, i32) -> Result<(), InjectorError>,
{
    for &(x, y) in points {
        step(x, y)?;
        thread::sleep(pause);
    }
    Ok(())
}

// -------------- Enigo backend --------------

#[derive(Clone, Copy, Debug)]
pub struct InjectorOptions {
    pub fail_safe: bool,
    /// Bézier control point offset for pointer glides, 0 for a straight line.
    pub jitter: i32,
}

pub struct EnigoInjector {
    enigo: enigo::Enigo,
    options: InjectorOptions,
}

impl EnigoInjector {
    pub fn new(options: InjectorOptions) -> Self {
        Self { enigo: enigo::Enigo::new(), options }
    }

    fn screen_size(&self) -> (i32, i32) {
        let (w, h) = self.enigo.main_display_size();
        (w as i32, h as i32)
    }

    fn fail_safe_check(&self) -> Result<(), InjectorError> {
        if !self.options.fail_safe {
            return Ok(());
        }
        let (x, y) = self.position();
        if on_screen_corner((x, y), self.screen_size()) {
            return Err(InjectorError::FailSafe { x, y });
        }
        Ok(())
    }
}

impl Injector for EnigoInjector {
    fn move_to(&mut self, x: i32, y: i32, duration: Duration) -> Result<(), InjectorError> {
        self.fail_safe_check()?;
        if duration.is_zero() {
            self.enigo.mouse_move_to(x, y);
            return Ok(());
        }

        let points = motion::path(self.position(), (x, y), self.options.jitter, &mut rand::thread_rng());
        let pause = duration / points.len() as u32;
        glide(&points, pause, |px, py| {
            self.fail_safe_check()?;
            self.enigo.mouse_move_to(px, py);
            Ok(())
        })
    }

    fn click(&mut self) -> Result<(), InjectorError> {
        self.fail_safe_check()?;
        self.enigo.mouse_click(MouseButton::Left);
        Ok(())
    }

    fn double_click(&mut self) -> Result<(), InjectorError> {
        self.fail_safe_check()?;
        self.enigo.mouse_click(MouseButton::Left);
        self.enigo.mouse_click(MouseButton::Left);
        Ok(())
    }

    fn hotkey(&mut self, modifier: Modifier, key: char) -> Result<(), InjectorError> {
        self.fail_safe_check()?;
        let held = || match modifier {
            Modifier::Control => Key::Control,
            Modifier::Command => Key::Meta,
        };
        self.enigo.key_down(held());
        self.enigo.key_click(Key::Layout(key));
        self.enigo.key_up(held());
        Ok(())
    }

    fn position(&self) -> (i32, i32) {
        let (x, y) = self.enigo.mouse_location();
        (x as i32, y as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_screen_corner() {
        let screen = (1920, 1080);
        assert!(on_screen_corner((0, 0), screen));
        assert!(on_screen_corner((1919, 0), screen));
        assert!(on_screen_corner((0, 1079), screen));
        assert!(on_screen_corner((1919, 1079), screen));

        assert!(!on_screen_corner((1, 0), screen));
        assert!(!on_screen_corner((0, 540), screen));
        assert!(!on_screen_corner((960, 540), screen));
    }

    #[test]
    fn test_glide_aborts_on_corner_mid_path() {
        let screen = (800, 600);
        let points = [(40, 30), (20, 15), (0, 0), (5, 5), (10, 10)];
        let mut pointer = (100, 100);
        let mut visited = Vec::new();

        let result = glide(&points, Duration::ZERO, |x, y| {
            if on_screen_corner(pointer, screen) {
                return Err(InjectorError::FailSafe { x: pointer.0, y: pointer.1 });
            }
            pointer = (x, y);
            visited.push((x, y));
            Ok(())
        });

        assert_eq!(result, Err(InjectorError::FailSafe { x: 0, y: 0 }));
        assert_eq!(visited, vec![(40, 30), (20, 15), (0, 0)]);
    }

    #[test]
    fn test_clipboard_modifier() {
        let expected = if cfg!(target_os = "macos") { Modifier::Command } else { Modifier::Control };
        assert_eq!(Modifier::clipboard(), expected);
    }
}
