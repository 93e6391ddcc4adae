//! Print boundary: the page-size directive handed to the host print flow.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::label::LabelSize;

/// One label per page, zero margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDirective {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageDirective {
    pub fn for_size(size: LabelSize) -> Self {
        Self {
            width_mm: size.width_mm,
            height_mm: size.height_mm,
        }
    }

    /// CSS `@page` rule for browser printing.
    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PageDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@page{{ size: {}mm {}mm; margin:0 }}",
            self.width_mm, self.height_mm
        )
    }
}

impl Serialize for PageDirective {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("PageDirective", 4)?;
        state.serialize_field("widthMm", &self.width_mm)?;
        state.serialize_field("heightMm", &self.height_mm)?;
        state.serialize_field("margin", &0)?;
        state.serialize_field("css", &self.to_css())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_css() {
        let page = PageDirective::for_size(LabelSize::new(38.0, 25.0));
        assert_eq!(page.to_css(), "@page{ size: 38mm 25mm; margin:0 }");
    }

    #[test]
    fn test_fractional_sizes() {
        let page = PageDirective::for_size(LabelSize::new(50.5, 30.0));
        assert_eq!(page.to_css(), "@page{ size: 50.5mm 30mm; margin:0 }");
    }

    #[test]
    fn test_serialized_shape() {
        let page = PageDirective::for_size(LabelSize::default());
        let json = serde_json::to_value(page).unwrap();
        assert_eq!(json["widthMm"], 38.0);
        assert_eq!(json["margin"], 0);
        assert_eq!(json["css"], "@page{ size: 38mm 25mm; margin:0 }");
    }
}
