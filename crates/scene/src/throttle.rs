use serde::{Deserialize, Serialize};

/// Scroll degradation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Quiet time after the last scroll event before full fidelity resumes (seconds).
    pub debounce: f32,
    /// Render resolution scale while degraded.
    pub degraded_render_scale: f32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            debounce: 0.15,
            degraded_render_scale: 0.5,
        }
    }
}

/// Performance throttle driven by host scroll activity.
///
/// Scrolling enters degraded mode; it ends on its own once `debounce` seconds
/// of scene time pass without another scroll event.
#[derive(Debug, Clone, Default)]
pub struct ScrollThrottle {
    config: ThrottleConfig,
    last_scroll: Option<f32>,
}

impl ScrollThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            last_scroll: None,
        }
    }

    /// Record a scroll event at scene time `now`.
    pub fn on_scroll(&mut self, now: f32) {
        if self.last_scroll.is_none() {
            tracing::debug!("scroll activity, degrading frame work");
        }
        self.last_scroll = Some(now);
    }

    /// Expire the debounce window if it has passed. Returns whether the
    /// frame at `now` runs degraded.
    pub fn update(&mut self, now: f32) -> bool {
        if let Some(last) = self.last_scroll {
            if now - last >= self.config.debounce {
                tracing::debug!("scroll settled, resuming full frame work");
                self.last_scroll = None;
            }
        }
        self.is_degraded()
    }

    pub fn is_degraded(&self) -> bool {
        self.last_scroll.is_some()
    }

    pub fn render_scale(&self) -> f32 {
        if self.is_degraded() {
            self.config.degraded_render_scale
        } else {
            1.0
        }
    }

    /// Drop any pending debounce timer.
    pub fn cancel(&mut self) {
        self.last_scroll = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_full_fidelity() {
        let mut t = ScrollThrottle::default();
        assert!(!t.update(0.0));
        assert_eq!(t.render_scale(), 1.0);
    }

    #[test]
    fn scroll_degrades_until_debounce_passes() {
        let mut t = ScrollThrottle::default();
        t.on_scroll(1.0);
        assert!(t.update(1.0));
        assert!(t.update(1.1));
        assert_eq!(t.render_scale(), 0.5);
        assert!(!t.update(1.2));
        assert_eq!(t.render_scale(), 1.0);
    }

    #[test]
    fn repeated_scrolls_extend_window() {
        let mut t = ScrollThrottle::default();
        t.on_scroll(0.0);
        t.on_scroll(0.1);
        assert!(t.update(0.2));
        assert!(!t.update(0.3));
    }

    #[test]
    fn cancel_clears_timer() {
        let mut t = ScrollThrottle::default();
        t.on_scroll(0.0);
        t.cancel();
        assert!(!t.is_degraded());
    }
}
