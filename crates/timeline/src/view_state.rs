/// Lowest zoom factor the timeline accepts.
pub const MIN_ZOOM: f64 = 0.5;
/// Highest zoom factor the timeline accepts.
pub const MAX_ZOOM: f64 = 3.0;

/// Visual translation of the rendered canvas layer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PanOffset {
    pub x: f64,
    pub y: f64,
}

impl PanOffset {
    pub const ZERO: PanOffset = PanOffset { x: 0.0, y: 0.0 };

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Transient interaction state of one timeline view.
///
/// Values are never mutated in place; each interaction produces a new state
/// that replaces the old one.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub zoom: f64,
    pub pan: PanOffset,
    pub selected_event: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: PanOffset::ZERO,
            selected_event: None,
        }
    }
}

impl ViewState {
    pub fn with_zoom(&self, zoom: f64) -> Self {
        let zoom = if zoom.is_finite() {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            self.zoom
        };
        Self {
            zoom,
            ..self.clone()
        }
    }

    /// Multiply the zoom factor by `1 + amount`.
    pub fn zoomed_in(&self, amount: f64) -> Self {
        if !amount.is_finite() || amount <= 0.0 {
            return self.clone();
        }
        self.with_zoom(self.zoom * (1.0 + amount))
    }

    /// Divide the zoom factor by `1 + amount`.
    pub fn zoomed_out(&self, amount: f64) -> Self {
        if !amount.is_finite() || amount <= 0.0 {
            return self.clone();
        }
        self.with_zoom(self.zoom / (1.0 + amount))
    }

    pub fn with_pan(&self, pan: PanOffset) -> Self {
        Self {
            pan,
            ..self.clone()
        }
    }

    pub fn panned_by(&self, dx: f64, dy: f64) -> Self {
        self.with_pan(self.pan.translated(dx, dy))
    }

    pub fn with_selection(&self, event_id: Option<String>) -> Self {
        Self {
            selected_event: event_id,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_stays_within_bounds_under_repetition() {
        let mut state = ViewState::default();
        for _ in 0..50 {
            state = state.zoomed_in(0.2);
            assert!((MIN_ZOOM..=MAX_ZOOM).contains(&state.zoom));
        }
        assert_eq!(state.zoom, MAX_ZOOM);

        for _ in 0..50 {
            state = state.zoomed_out(0.2);
            assert!((MIN_ZOOM..=MAX_ZOOM).contains(&state.zoom));
        }
        assert_eq!(state.zoom, MIN_ZOOM);
    }

    #[test]
    fn huge_and_degenerate_amounts_are_clamped_or_ignored() {
        let state = ViewState::default();
        assert_eq!(state.zoomed_in(1e9).zoom, MAX_ZOOM);
        assert_eq!(state.zoomed_out(1e9).zoom, MIN_ZOOM);
        assert_eq!(state.zoomed_in(f64::NAN).zoom, 1.0);
        assert_eq!(state.zoomed_out(-3.0).zoom, 1.0);
        assert_eq!(state.with_zoom(f64::INFINITY).zoom, 1.0);
    }

    #[test]
    fn pan_and_reverse_pan_restore_offset() {
        let state = ViewState::default().panned_by(-120.0, 15.0);
        assert_eq!(state.pan, PanOffset { x: -120.0, y: 15.0 });
        let back = state.panned_by(120.0, -15.0);
        assert_eq!(back.pan, PanOffset::ZERO);
    }

    #[test]
    fn transitions_leave_other_fields_alone() {
        let state = ViewState::default()
            .with_selection(Some("e1".to_string()))
            .panned_by(10.0, 0.0)
            .zoomed_in(0.2);
        assert_eq!(state.selected_event.as_deref(), Some("e1"));
        assert_eq!(state.pan.x, 10.0);
        assert!((state.zoom - 1.2).abs() < 1e-12);
    }
}
