use crate::id::PostId;

/// Page number used when none (or a non-positive one) is requested.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when none (or a non-positive one) is requested.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page size a caller can ask for; larger requests are clamped.
pub const MAX_PAGE_SIZE: usize = 50;

/// A page size already normalized into `1..=MAX_PAGE_SIZE`.
///
/// The only way to build one is [`PageSize::normalize`], so the engine can
/// rely on the bound without checking it again.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageSize(usize);

impl PageSize {
    /// Missing, zero, or negative sizes become [`DEFAULT_PAGE_SIZE`]; sizes
    /// above [`MAX_PAGE_SIZE`] are clamped to it.
    ///
    /// ```
    /// use trendboard::PageSize;
    ///
    /// assert_eq!(PageSize::normalize(None).get(), 20);
    /// assert_eq!(PageSize::normalize(Some(0)).get(), 20);
    /// assert_eq!(PageSize::normalize(Some(-3)).get(), 20);
    /// assert_eq!(PageSize::normalize(Some(999)).get(), 50);
    /// assert_eq!(PageSize::normalize(Some(10)).get(), 10);
    /// ```
    pub fn normalize(requested: Option<i64>) -> Self {
        match requested {
            Some(size) if size >= 1 => {
                Self(usize::try_from(size).map_or(MAX_PAGE_SIZE, |s| s.min(MAX_PAGE_SIZE)))
            }
            _ => Self(DEFAULT_PAGE_SIZE),
        }
    }

    pub const fn get(self) -> usize {
        self.0
    }

    /// The number of rows to fetch to learn whether another page exists.
    pub(crate) const fn probe(self) -> usize {
        self.0 + 1
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZE)
    }
}

/// A request for a numbered page (1-based) in listing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffsetRequest {
    page: u32,
    size: PageSize,
}

impl OffsetRequest {
    /// Normalizes raw query parameters: a missing or non-positive page
    /// becomes [`DEFAULT_PAGE`], and the size follows
    /// [`PageSize::normalize`].
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        let page = match page {
            Some(page) if page >= 1 => u32::try_from(page).unwrap_or(u32::MAX),
            _ => DEFAULT_PAGE,
        };
        Self {
            page,
            size: PageSize::normalize(size),
        }
    }

    pub const fn page(&self) -> u32 {
        self.page
    }

    pub const fn size(&self) -> PageSize {
        self.size
    }

    /// Rows to skip: `(page - 1) * size`.
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.size.get() as u64
    }
}

impl Default for OffsetRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// A request for the page following `cursor_id` in identifier order. The
/// first page has no cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorRequest {
    cursor_id: Option<PostId>,
    size: PageSize,
}

impl CursorRequest {
    pub fn new(cursor_id: Option<PostId>, size: Option<i64>) -> Self {
        Self {
            cursor_id,
            size: PageSize::normalize(size),
        }
    }

    /// The first page of a cursor walk.
    pub fn first(size: Option<i64>) -> Self {
        Self::new(None, size)
    }

    /// The request for the page after one that returned `next_cursor_id`,
    /// keeping this request's size.
    pub const fn after(&self, next_cursor_id: PostId) -> Self {
        Self {
            cursor_id: Some(next_cursor_id),
            size: self.size,
        }
    }

    pub const fn cursor_id(&self) -> Option<PostId> {
        self.cursor_id
    }

    pub const fn size(&self) -> PageSize {
        self.size
    }
}

/// One listing request, in exactly one of the two pagination forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageRequest {
    Offset(OffsetRequest),
    Cursor(CursorRequest),
}

impl PageRequest {
    pub const fn size(&self) -> PageSize {
        match self {
            Self::Offset(request) => request.size(),
            Self::Cursor(request) => request.size(),
        }
    }
}

impl From<OffsetRequest> for PageRequest {
    fn from(request: OffsetRequest) -> Self {
        Self::Offset(request)
    }
}

impl From<CursorRequest> for PageRequest {
    fn from(request: CursorRequest) -> Self {
        Self::Cursor(request)
    }
}
