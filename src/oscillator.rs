/// Triangle wave over `period` frames: `peak` at frame 0, `-peak` at the
/// half period, climbing back toward `peak`. Frames past the period are not
/// wrapped here.
pub fn center_height(frame: u32, period: u32, peak: f32) -> f32 {
    let half = (period / 2).max(1) as f32;
    let frame = frame as f32;
    let swing = 2.0 * peak;
    if frame < half {
        peak - swing * (frame / half)
    } else {
        -peak + swing * ((frame - half) / half)
    }
}

/// Current frame of the animation. Advanced by the frame driver, wraps
/// back to 0 after the last frame of the period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Animation {
    frame: u32,
    period: u32,
}

impl Animation {
    pub fn new(period: u32) -> Self {
        Self {
            frame: 0,
            period: period.max(1),
        }
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Steps to the next frame. Returns true when the period restarted.
    pub fn advance(&mut self) -> bool {
        self.frame += 1;
        if self.frame >= self.period {
            self.frame = 0;
            true
        } else {
            false
        }
    }
}
