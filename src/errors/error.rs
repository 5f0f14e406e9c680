use std::any::Any;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Upper bound on how many links a chain walk will follow.
///
/// Parents are fixed at construction so a chain cannot loop; the bound only
/// stops a runaway walk over a pathologically long chain.
pub const MAX_CHAIN_DEPTH: usize = 1024;

/// Shared, immutable error handle.
///
/// Cloning is cheap and keeps identity: two clones of the same value are the
/// same error for [`Error::is`], while two values built separately never are,
/// even when they carry the same code.
#[derive(Clone)]
pub struct Error {
    inner: Arc<Node>,
}

#[derive(Debug)]
enum Node {
    Coded(CodedError),
    Message {
        message: String,
        parent: Option<Error>,
    },
    Foreign(Box<dyn StdError + Send + Sync>),
    Panic(String),
}

/// An error carrying a stable machine-readable code, optionally wrapping a parent.
#[derive(Debug)]
pub struct CodedError {
    code: Cow<'static, str>,
    message: String,
    parent: Option<Error>,
}

impl CodedError {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn parent(&self) -> Option<&Error> {
        self.parent.as_ref()
    }
}

/// Wrap `parent` with a new coded error that has no message of its own.
pub fn add_code(parent: Option<Error>, code: impl Into<Cow<'static, str>>) -> Error {
    add_code_with_message(parent, code, String::new())
}

/// Wrap `parent` with a new coded error carrying `message`.
pub fn add_code_with_message(
    parent: Option<Error>,
    code: impl Into<Cow<'static, str>>,
    message: impl Into<String>,
) -> Error {
    let code = code.into();
    debug_assert!(!code.is_empty(), "error codes must not be empty");

    Error::from_node(Node::Coded(CodedError {
        code,
        message: message.into(),
        parent,
    }))
}

/// Parent of `err`, if it has one.
pub fn unwrap(err: &Error) -> Option<Error> {
    err.parent().cloned()
}

/// Whether `target` (by identity) appears anywhere in the chain of `err`.
pub fn is(err: &Error, target: &Error) -> bool {
    err.is(target)
}

impl Error {
    fn from_node(node: Node) -> Self {
        Self {
            inner: Arc::new(node),
        }
    }

    /// A plain error with no code and no parent.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::from_node(Node::Message {
            message: message.into(),
            parent: None,
        })
    }

    /// Prefix `parent` with `message`, keeping it reachable through [`Error::parent`].
    pub fn wrap(parent: Error, message: impl Into<String>) -> Self {
        Self::from_node(Node::Message {
            message: message.into(),
            parent: Some(parent),
        })
    }

    /// Adopt an error produced by a library.
    pub fn foreign<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::from_node(Node::Foreign(Box::new(err)))
    }

    /// Turn a recovered panic payload into an error.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::from_node(Node::Panic(panic_message(payload)))
    }

    pub fn parent(&self) -> Option<&Error> {
        match self.inner.as_ref() {
            Node::Coded(coded) => coded.parent.as_ref(),
            Node::Message { parent, .. } => parent.as_ref(),
            Node::Foreign(_) | Node::Panic(_) => None,
        }
    }

    pub fn as_coded(&self) -> Option<&CodedError> {
        match self.inner.as_ref() {
            Node::Coded(coded) => Some(coded),
            _ => None,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self.inner.as_ref(), Node::Panic(_))
    }

    /// Walk from this error towards the root, outermost first.
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            next: Some(self),
            depth: 0,
        }
    }

    pub fn is(&self, target: &Error) -> bool {
        self.chain().any(|link| link.ptr_eq(target))
    }

    pub fn ptr_eq(&self, other: &Error) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Iterator over an error chain, bounded by [`MAX_CHAIN_DEPTH`].
pub struct Chain<'a> {
    next: Option<&'a Error>,
    depth: usize,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Error;

    fn next(&mut self) -> Option<Self::Item> {
        if self.depth >= MAX_CHAIN_DEPTH {
            return None;
        }

        let current = self.next?;
        self.depth += 1;
        self.next = current.parent();
        Some(current)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.as_ref() {
            Node::Coded(coded) => {
                if !coded.message.is_empty() {
                    f.write_str(&coded.message)
                } else if let Some(parent) = &coded.parent {
                    fmt::Display::fmt(parent, f)
                } else {
                    f.write_str(&coded.code)
                }
            }
            Node::Message {
                message,
                parent: Some(parent),
            } => write!(f, "{}; {}", message, parent),
            Node::Message {
                message,
                parent: None,
            } => f.write_str(message),
            Node::Foreign(err) => fmt::Display::fmt(err, f),
            Node::Panic(message) => write!(f, "panic: {}", message),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.inner.as_ref(), f)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self.inner.as_ref() {
            Node::Foreign(err) => err.source(),
            _ => self.parent().map(|parent| parent as &(dyn StdError + 'static)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::foreign(err)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
