use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // Area inside the outer border
    pub main_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions required for the application
    /// Width: the two-column form needs room for "Publish date (YYYY-MM-DD)" titles
    /// Height: 2 outer borders + form fields (5 x 3 lines) + 2 form borders + 1 status
    pub const MIN_WIDTH: u16 = 60;
    pub const MIN_HEIGHT: u16 = 20;

    pub fn calculate(size: Rect) -> Self {
        // Calculate inner area (accounting for outer border: 1 char on each side)
        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Table or form
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        Self {
            inner_area,
            main_area: vertical[0],
            status_area: vertical[1],
        }
    }

    pub fn fits(size: Rect) -> bool {
        size.width >= Self::MIN_WIDTH && size.height >= Self::MIN_HEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_bar_takes_last_inner_line() {
        let layout = Layout::calculate(Rect::new(0, 0, 80, 24));
        assert_eq!(layout.inner_area, Rect::new(1, 1, 78, 22));
        assert_eq!(layout.status_area, Rect::new(1, 22, 78, 1));
        assert_eq!(layout.main_area.height, 21);
    }

    #[test]
    fn minimum_size_check() {
        assert!(Layout::fits(Rect::new(0, 0, 60, 20)));
        assert!(!Layout::fits(Rect::new(0, 0, 59, 40)));
    }
}
