//! "The season's grand gift" promo carousel.

/// One carousel slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoSlide {
    pub title: &'static str,
    pub threshold: &'static str,
    pub tagline: &'static str,
    pub call_to_action: &'static str,
    pub fine_print: &'static str,
    pub icon: &'static str,
}

/// The slides currently on rotation.
pub const SEASON_SLIDES: [PromoSlide; 3] = [
    PromoSlide {
        title: "FREE jewellery box*",
        threshold: "above ₹1999",
        tagline: "store your bling in style.",
        call_to_action: "choose this",
        fine_print: "*color may vary",
        icon: "💎",
    },
    PromoSlide {
        title: "FREE Shipping*",
        threshold: "above ₹999",
        tagline: "get your favorite products delivered free.",
        call_to_action: "shop now",
        fine_print: "*valid on orders above ₹999",
        icon: "🚚",
    },
    PromoSlide {
        title: "Extra 15% OFF*",
        threshold: "on all products",
        tagline: "use code: SEASON15 at checkout.",
        call_to_action: "shop now",
        fine_print: "*valid till stock lasts",
        icon: "🎁",
    },
];

/// Carousel position over a fixed list of slides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoCarousel {
    slides: Vec<PromoSlide>,
    current: usize,
}

impl Default for PromoCarousel {
    fn default() -> Self {
        Self::new(SEASON_SLIDES.to_vec())
    }
}

impl PromoCarousel {
    /// Start at the first slide.
    #[must_use]
    pub const fn new(slides: Vec<PromoSlide>) -> Self {
        Self { slides, current: 0 }
    }

    /// Index of the visible slide.
    #[must_use]
    pub const fn current(&self) -> usize {
        self.current
    }

    /// All slides.
    #[must_use]
    pub fn slides(&self) -> &[PromoSlide] {
        &self.slides
    }

    /// The visible slide, if there are any.
    #[must_use]
    pub fn current_slide(&self) -> Option<&PromoSlide> {
        self.slides.get(self.current)
    }

    /// Advance, wrapping after the last slide.
    pub fn next(&mut self) {
        if !self.slides.is_empty() {
            self.current = (self.current + 1) % self.slides.len();
        }
    }

    /// Go back, wrapping before the first slide.
    pub fn prev(&mut self) {
        if !self.slides.is_empty() {
            self.current = (self.current + self.slides.len() - 1) % self.slides.len();
        }
    }

    /// Jump to a slide; out-of-range indices wrap.
    pub fn select(&mut self, index: usize) {
        if !self.slides.is_empty() {
            self.current = index % self.slides.len();
        }
    }

    /// Carousel positioned from a `?slide=` value.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        let mut carousel = Self::default();
        if let Some(index) = value.and_then(|v| v.trim().parse::<usize>().ok()) {
            carousel.select(index);
        }
        carousel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_wraps() {
        let mut carousel = PromoCarousel::default();
        carousel.next();
        carousel.next();
        assert_eq!(carousel.current(), 2);
        carousel.next();
        assert_eq!(carousel.current(), 0);
    }

    #[test]
    fn test_prev_wraps() {
        let mut carousel = PromoCarousel::default();
        carousel.prev();
        assert_eq!(carousel.current(), 2);
        assert_eq!(
            carousel.current_slide().map(|s| s.title),
            Some("Extra 15% OFF*")
        );
    }

    #[test]
    fn test_select_and_query() {
        assert_eq!(PromoCarousel::from_query(Some("1")).current(), 1);
        assert_eq!(PromoCarousel::from_query(Some("7")).current(), 1);
        assert_eq!(PromoCarousel::from_query(Some("abc")).current(), 0);
        assert_eq!(PromoCarousel::from_query(None).current(), 0);
    }

    #[test]
    fn test_empty_carousel_stays_put() {
        let mut carousel = PromoCarousel::new(Vec::new());
        carousel.next();
        carousel.prev();
        carousel.select(4);
        assert_eq!(carousel.current(), 0);
        assert!(carousel.current_slide().is_none());
    }
}
