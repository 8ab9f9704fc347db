/// Parser options for controlling limits and error recovery.
///
/// These options allow you to trade strict PDF compliance for broader
/// compatibility with malformed or hand-edited files, and bound the work a
/// hostile file can cause.
///
/// # Example
///
/// ```
/// use pdf_import::geometry::BoxType;
/// use pdf_import::parser_config::ParserOptions;
///
/// // Strict mode - fail on recoverable syntax problems
/// let strict = ParserOptions::strict();
///
/// // Lenient mode - recover where possible (default)
/// let lenient = ParserOptions::lenient();
///
/// // Custom configuration
/// let custom = ParserOptions::default()
///     .with_max_parent_depth(16)
///     .with_follow_nested_page_trees(true)
///     .with_default_box(BoxType::MediaBox);
/// assert_eq!(custom.max_parent_depth, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParserOptions {
    /// Fail on recoverable problems (true) or log and continue (false)
    ///
    /// Affects unterminated literal strings and xref entries whose flag is
    /// neither `n` nor `f`.
    pub strict: bool,

    /// Maximum nesting depth of arrays and dictionaries
    ///
    /// Also bounds recursion into nested page tree nodes.
    ///
    /// PDF Spec: ISO 32000-1:2008, Section H.1 - Implementation Limits
    pub max_nesting: usize,

    /// Maximum length in bytes of a single literal string
    pub max_string_length: usize,

    /// Maximum number of `/Parent` hops when looking up inherited attributes
    pub max_parent_depth: usize,

    /// Recurse into `/Kids` entries whose `/Type` is `/Pages`
    ///
    /// Off by default: every kid is treated as a leaf page.
    pub follow_nested_page_trees: bool,

    /// Box name reported with every box query
    pub default_box: crate::geometry::BoxType,
}

impl Default for ParserOptions {
    /// Default configuration: lenient mode
    fn default() -> Self {
        Self::lenient()
    }
}

impl ParserOptions {
    /// Strict mode: fail on any recoverable parsing problem
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::lenient()
        }
    }

    /// Lenient mode: log and recover from parsing problems
    pub fn lenient() -> Self {
        Self {
            strict: false,
            max_nesting: 100, // ISO 32000 implementation limit
            max_string_length: 32 * 1024 * 1024,
            max_parent_depth: 64,
            follow_nested_page_trees: false,
            default_box: crate::geometry::BoxType::CropBox,
        }
    }

    /// Set the maximum array/dictionary nesting depth.
    pub fn with_max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = depth;
        self
    }

    /// Set the maximum literal string length.
    pub fn with_max_string_length(mut self, len: usize) -> Self {
        self.max_string_length = len;
        self
    }

    /// Set the maximum number of `/Parent` hops.
    pub fn with_max_parent_depth(mut self, depth: usize) -> Self {
        self.max_parent_depth = depth;
        self
    }

    /// Enable or disable recursion into nested page tree nodes.
    pub fn with_follow_nested_page_trees(mut self, follow: bool) -> Self {
        self.follow_nested_page_trees = follow;
        self
    }

    /// Set the default box name.
    pub fn with_default_box(mut self, default_box: crate::geometry::BoxType) -> Self {
        self.default_box = default_box;
        self
    }
}
