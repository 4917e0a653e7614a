//! Page geometry
//!
//! A document has exactly one page master. Its geometry also fixes the
//! printable width that table column percentages are resolved against.

/// Name of the page layout in styles.xml
pub const PAGE_LAYOUT_NAME: &str = "pm1";

/// Name of the master page in styles.xml
pub const MASTER_PAGE_NAME: &str = "Standard";

/// Size and margins of the page master (all lengths in cm)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub width_cm: f64,
    pub height_cm: f64,
    pub margin_cm: f64,
}

impl PageLayout {
    /// A4 portrait with 2 cm margins on every side
    pub const A4: PageLayout = PageLayout {
        width_cm: 21.0,
        height_cm: 29.7,
        margin_cm: 2.0,
    };

    /// Page width minus the left and right margins
    pub fn printable_width_cm(&self) -> f64 {
        self.width_cm - 2.0 * self.margin_cm
    }

    /// `style:print-orientation` value implied by the page size
    pub fn orientation(&self) -> &'static str {
        if self.width_cm > self.height_cm {
            "landscape"
        } else {
            "portrait"
        }
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::A4
    }
}
