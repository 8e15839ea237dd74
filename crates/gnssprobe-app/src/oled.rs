//! Display adapter that mirrors frames into the slint window.

use gnssprobe_core::{Align, Display, DrawOp, FrameBuffer};
use std::rc::Rc;

use crate::{MainWindow, TextItem};

pub struct OledWindow {
    frame: FrameBuffer,
    window: slint::Weak<MainWindow>,
}

impl OledWindow {
    pub fn new(window: slint::Weak<MainWindow>) -> Self {
        Self {
            frame: FrameBuffer::new(),
            window,
        }
    }

    fn present(&self) {
        let Some(window) = self.window.upgrade() else {
            return;
        };

        let mut items = Vec::new();
        let mut bar = None;
        for op in self.frame.shown() {
            match op {
                DrawOp::Text { x, y, align, text } => items.push(TextItem {
                    x: *x,
                    y: *y,
                    text: text.as_str().into(),
                    right: *align == Align::Right,
                }),
                DrawOp::ProgressBar { x, y, width, height, percent } => {
                    bar = Some((*x, *y, *width, *height, *percent));
                }
            }
        }

        window.set_items(Rc::new(slint::VecModel::from(items)).into());
        window.set_bar_visible(bar.is_some());
        if let Some((x, y, width, height, percent)) = bar {
            window.set_bar_x(x);
            window.set_bar_y(y);
            window.set_bar_width(width);
            window.set_bar_height(height);
            window.set_bar_percent(i32::from(percent));
        }
    }
}

impl Display for OledWindow {
    fn clear(&mut self) {
        self.frame.clear();
    }

    fn draw_string(&mut self, x: i32, y: i32, align: Align, text: &str) {
        self.frame.draw_string(x, y, align, text);
    }

    fn draw_progress_bar(&mut self, x: i32, y: i32, width: i32, height: i32, percent: u8) {
        self.frame.draw_progress_bar(x, y, width, height, percent);
    }

    fn flush(&mut self) {
        self.frame.flush();
        self.present();
    }
}
