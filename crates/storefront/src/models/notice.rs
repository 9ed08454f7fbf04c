//! Flash-style notices carried in redirect query strings.
//!
//! Handlers redirect with `?notice=added` or `?error=session_expired` and the
//! target page maps the code back to text. Unknown codes are ignored, so a
//! hand-edited URL can never inject text into a page.

/// Visual tone of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

impl NoticeKind {
    /// CSS modifier class.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "notice--success",
            Self::Info => "notice--info",
            Self::Error => "notice--error",
        }
    }
}

/// A user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: &'static str,
}

impl Notice {
    const fn new(kind: NoticeKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// Map a short code to its notice.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let notice = match code {
            "added" => Self::new(NoticeKind::Success, "Product added to cart!"),
            "all_added" => Self::new(NoticeKind::Success, "All products added to cart!"),
            "cart_updated" => Self::new(NoticeKind::Success, "Cart updated."),
            "removed" => Self::new(NoticeKind::Success, "Item removed from cart."),
            "order_placed" => Self::new(
                NoticeKind::Success,
                "Order placed! You can track it below.",
            ),
            "profile_updated" => Self::new(NoticeKind::Success, "Profile updated."),
            "logged_out" => Self::new(NoticeKind::Info, "You have been logged out."),
            "login_required" => {
                Self::new(NoticeKind::Error, "Please login to add items to cart")
            }
            "session_expired" => Self::new(
                NoticeKind::Error,
                "Your session has expired. Please login again.",
            ),
            "cart_failed" => Self::new(
                NoticeKind::Error,
                "We couldn't update your cart. Please try again.",
            ),
            "unavailable" => Self::new(
                NoticeKind::Error,
                "We're having trouble reaching the store right now. Please try again shortly.",
            ),
            _ => return None,
        };
        Some(notice)
    }

    /// Pick the notice for a page from its `notice` and `error` parameters.
    ///
    /// Errors win when both are present.
    #[must_use]
    pub fn from_query(notice: Option<&str>, error: Option<&str>) -> Option<Self> {
        error
            .and_then(Self::from_code)
            .or_else(|| notice.and_then(Self::from_code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        let notice = Notice::from_code("added");
        assert_eq!(
            notice.map(|n| n.message),
            Some("Product added to cart!")
        );
        assert_eq!(
            Notice::from_code("login_required").map(|n| n.kind),
            Some(NoticeKind::Error)
        );
    }

    #[test]
    fn test_unknown_code_is_ignored() {
        assert_eq!(Notice::from_code("<script>"), None);
        assert_eq!(Notice::from_query(Some("nope"), None), None);
    }

    #[test]
    fn test_error_wins_over_notice() {
        let notice = Notice::from_query(Some("added"), Some("session_expired"));
        assert_eq!(notice.map(|n| n.kind), Some(NoticeKind::Error));

        let notice = Notice::from_query(Some("added"), Some("bogus"));
        assert_eq!(notice.map(|n| n.kind), Some(NoticeKind::Success));
    }
}
