use thiserror::Error;

/// Which link on an element prevented it from being attached.
///
/// An element is eligible for attachment only when it is fully detached:
/// no parent and no siblings. This names the first offending link so the
/// caller can see which invariant the element violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachLink {
    /// The element still has a left sibling.
    DanglingLeftSibling,
    /// The element still has a right sibling.
    DanglingRightSibling,
    /// The element still has a parent.
    DanglingParent,
    /// The element is the document root, which is never attachable.
    Root,
}

impl AttachLink {
    /// Short human-readable description used in error messages.
    pub const fn describe(self) -> &'static str {
        match self {
            Self::DanglingLeftSibling => "dangling left sibling",
            Self::DanglingRightSibling => "dangling right sibling",
            Self::DanglingParent => "dangling parent",
            Self::Root => "cannot attach the root element",
        }
    }
}

/// Primary error type for mutable document operations.
///
/// Modeled as structured variants for each way a mutation can be rejected.
/// Validation always precedes any arena write, so an error implies the
/// document is unchanged.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutBsonError {
    /// The element being attached is not detached.
    #[error("element is not attachable: {}", .link.describe())]
    IllegalAttach {
        /// The first link found preventing attachment.
        link: AttachLink,
    },

    /// Sibling insertion was requested on an element without a parent.
    #[error("attempt to add a sibling to an element without a parent")]
    NoParent,

    /// The root element cannot be removed from its document.
    #[error("attempt to remove the root element")]
    RemoveRoot,

    /// The requested operation is not permitted on the root element.
    #[error("operation is not permitted on the root element")]
    IllegalRoot,

    /// A child was pushed onto an element that cannot hold children.
    #[error("attempt to add a child to a non-container element")]
    NotComposite,

    /// An encoded element carried the end-of-object tag byte.
    #[error("encoded element has an end-of-object type tag")]
    BadType,

    /// A handle minted by one document was passed to another.
    #[error("element handle belongs to a different document")]
    WrongDocument,
}

impl MutBsonError {
    /// Create an [`MutBsonError::IllegalAttach`] for the given link.
    pub const fn illegal_attach(link: AttachLink) -> Self {
        Self::IllegalAttach { link }
    }

    /// Whether the error indicates API misuse rather than bad input data.
    pub const fn is_misuse(&self) -> bool {
        !matches!(self, Self::BadType)
    }
}

/// Result type alias using `MutBsonError`.
pub type Result<T> = std::result::Result<T, MutBsonError>;
