// SPDX-License-Identifier: MPL-2.0 OR LGPL-3.0-or-later
/*
 * beneath: confined path resolution for POSIX filesystems
 * Copyright (C) 2026 The beneath Authors
 *
 * == MPL-2.0 ==
 *
 *  This Source Code Form is subject to the terms of the Mozilla Public
 *  License, v. 2.0. If a copy of the MPL was not distributed with this
 *  file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * Alternatively, this Source Code Form may also (at your option) be used
 * under the terms of the GNU Lesser General Public License Version 3, as
 * described below:
 *
 * == LGPL-3.0-or-later ==
 *
 *  This program is free software: you can redistribute it and/or modify it
 *  under the terms of the GNU Lesser General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or (at
 *  your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful, but
 *  WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General
 *  Public License for more details.
 *
 *  You should have received a copy of the GNU Lesser General Public License
 *  along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

//! Error types returned by `beneath`.
//!
//! [`Error`] is an opaque wrapper around [`ErrorImpl`] so that the internal
//! representation can grow new variants without being a breaking change.
//! Callers that need to branch on the failure reason should match on
//! [`Error::kind`] rather than on the `Display` text.

use std::borrow::Cow;
use std::fmt;
use std::io;

use rustix::io::Errno;

/// The public error type returned by all fallible operations in this crate.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(#[from] Box<ErrorImpl>);

impl<E: Into<ErrorImpl>> From<E> for Error {
    fn from(err: E) -> Self {
        Self(Box::new(err.into()))
    }
}

impl Error {
    /// The programmatically-matchable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        self.0.kind()
    }

    /// Whether retrying the same operation might succeed (`EAGAIN`/`EINTR`).
    pub fn can_retry(&self) -> bool {
        self.0.can_retry()
    }

    /// The underlying raw `errno` value, if this error originated from an
    /// OS call.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self.kind() {
            ErrorKind::OsError(errno) => errno,
            _ => None,
        }
    }
}

/// Stable, programmatically-matchable classification of an [`Error`].
///
/// This is intentionally coarser than [`ErrorImpl`] -- new internal variants
/// can be added without this enum changing, as long as they map onto an
/// existing kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A path component did not exist.
    NotFound,
    /// A non-directory was used where a directory was required.
    NotADirectory,
    /// Too many symlinks were traversed, or a symlink was encountered where
    /// one was forbidden.
    Loop,
    /// The resolved path was proven to lie outside the confinement root.
    CrossDevice,
    /// The OS gave an internally inconsistent response; the caller should
    /// retry the whole operation.
    TryAgain,
    /// An invalid (e.g. negative) file descriptor was supplied.
    BadDescriptor,
    /// The requested operation is not supported on this platform or for
    /// this kind of file.
    NotSupported,
    /// A caller-supplied argument was malformed.
    InvalidArgument,
    /// An internal invariant was violated; this indicates a bug.
    InternalError,
    /// Any other OS-level error, identified by raw `errno` when available.
    OsError(Option<i32>),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::NotADirectory => write!(f, "not a directory"),
            Self::Loop => write!(f, "too many levels of symbolic links"),
            Self::CrossDevice => write!(f, "resolved path escapes root"),
            Self::TryAgain => write!(f, "inconsistent filesystem state, try again"),
            Self::BadDescriptor => write!(f, "bad file descriptor"),
            Self::NotSupported => write!(f, "operation not supported"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::InternalError => write!(f, "internal error"),
            Self::OsError(Some(errno)) => write!(f, "os error {errno}"),
            Self::OsError(None) => write!(f, "unknown os error"),
        }
    }
}

/// Internal, exhaustively-matched error representation. Not exposed
/// directly -- always accessed through [`Error`] and [`ErrorKind`].
#[derive(Debug, thiserror::Error)]
pub enum ErrorImpl {
    #[error("{operation}: component not found")]
    NotFound { operation: Cow<'static, str> },

    #[error("{operation}: not a directory")]
    NotADirectory { operation: Cow<'static, str> },

    #[error("{operation}: too many levels of symbolic links")]
    SymlinkLoop { operation: Cow<'static, str> },

    #[error("{operation}: resolved path escaped the confinement root")]
    Escaped { operation: Cow<'static, str> },

    #[error("{operation}: inconsistent filesystem state")]
    TryAgain { operation: Cow<'static, str> },

    #[error("{operation}: bad file descriptor")]
    BadDescriptor { operation: Cow<'static, str> },

    #[error("{operation}: not supported")]
    NotSupported { operation: Cow<'static, str> },

    #[error("invalid argument: {description}")]
    InvalidArgument { description: Cow<'static, str> },

    #[error("internal error: {description}")]
    InternalError { description: Cow<'static, str> },

    #[error("{operation}: {source}")]
    OsError {
        operation: Cow<'static, str>,
        #[source]
        source: io::Error,
    },

    #[error("{operation}: {source}")]
    RawOsError {
        operation: Cow<'static, str>,
        #[source]
        source: Errno,
    },

    #[error("{context}: {source}")]
    Wrapped {
        context: String,
        #[source]
        source: Error,
    },
}

impl ErrorImpl {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotADirectory { .. } => ErrorKind::NotADirectory,
            Self::SymlinkLoop { .. } => ErrorKind::Loop,
            Self::Escaped { .. } => ErrorKind::CrossDevice,
            Self::TryAgain { .. } => ErrorKind::TryAgain,
            Self::BadDescriptor { .. } => ErrorKind::BadDescriptor,
            Self::NotSupported { .. } => ErrorKind::NotSupported,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InternalError { .. } => ErrorKind::InternalError,
            Self::OsError { source, .. } => ErrorKind::OsError(source.raw_os_error()),
            Self::RawOsError { source, .. } => ErrorKind::OsError(Some(source.raw_os_error())),
            Self::Wrapped { source, .. } => source.kind(),
        }
    }

    fn can_retry(&self) -> bool {
        match self {
            Self::TryAgain { .. } => true,
            Self::OsError { source, .. } => matches!(
                source.raw_os_error(),
                Some(libc::EAGAIN) | Some(libc::EINTR)
            ),
            Self::RawOsError { source, .. } => {
                matches!(*source, Errno::AGAIN | Errno::INTR)
            }
            Self::Wrapped { source, .. } => source.can_retry(),
            _ => false,
        }
    }
}

impl From<Errno> for ErrorImpl {
    fn from(errno: Errno) -> Self {
        Self::errno_with_op(errno, "syscall")
    }
}

impl ErrorImpl {
    /// Classify a raw `errno` from a named operation into the taxonomy of
    /// [`ErrorKind`], normalizing the platform-specific errno values that
    /// mean "opened a symlink with no-follow" into [`ErrorKind::Loop`].
    pub(crate) fn errno_with_op(errno: Errno, operation: impl Into<Cow<'static, str>>) -> Self {
        let operation = operation.into();
        match errno {
            Errno::NOENT => Self::NotFound { operation },
            Errno::NOTDIR => Self::NotADirectory { operation },
            Errno::LOOP => Self::SymlinkLoop { operation },
            Errno::XDEV => Self::Escaped { operation },
            Errno::AGAIN => Self::TryAgain { operation },
            Errno::BADF => Self::BadDescriptor { operation },
            Errno::NOSYS | Errno::OPNOTSUPP => Self::NotSupported { operation },
            Errno::INVAL => Self::InvalidArgument {
                description: operation,
            },
            other => Self::RawOsError {
                operation,
                source: other,
            },
        }
    }
}

/// Whether a raw `errno` is one of the platform-specific variants that can
/// mean "this is actually a symlink and you asked for no-follow" (component
/// G's normalization step, spec §4.D/§4.G).
pub(crate) fn is_maybe_symlink_errno(errno: Errno) -> bool {
    // ELOOP is the common case. EMLINK (historical BSD) and ENOTDIR (when
    // O_DIRECTORY|O_NOFOLLOW is combined) are the other two documented
    // variants; EFTYPE (NetBSD) is not representable in `rustix::io::Errno`
    // on Linux builds and is handled by the raw_os_error fallback in the
    // syscalls layer on non-Linux targets.
    matches!(errno, Errno::LOOP | Errno::MLINK | Errno::NOTDIR)
}

/// Extension trait for attaching human-readable context to an error without
/// changing its [`ErrorKind`].
pub trait ErrorExt {
    #[must_use]
    fn wrap(self, context: impl Into<String>) -> Error;

    #[must_use]
    fn with_wrap<F, S>(self, context: F) -> Error
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<E: Into<Error>> ErrorExt for E {
    fn wrap(self, context: impl Into<String>) -> Error {
        Error::from(ErrorImpl::Wrapped {
            context: context.into(),
            source: self.into(),
        })
    }

    fn with_wrap<F, S>(self, context: F) -> Error
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.wrap(context().into())
    }
}

/// Extension trait for mapping the `Err` side of a `Result` with context,
/// the common case at call sites (`op().context(|| ...)?`).
pub trait ResultExt<T> {
    fn context<S: Into<String>>(self, context: S) -> Result<T, Error>;
    fn with_context<F, S>(self, context: F) -> Result<T, Error>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: Into<Error>> ResultExt<T> for Result<T, E> {
    fn context<S: Into<String>>(self, context: S) -> Result<T, Error> {
        self.map_err(|err| err.wrap(context))
    }

    fn with_context<F, S>(self, context: F) -> Result<T, Error>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|err| err.with_wrap(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kind_roundtrips_through_wrap() {
        let err: Error = ErrorImpl::NotFound {
            operation: "open".into(),
        }
        .into();
        let wrapped = err.wrap("resolving /a/b");
        assert_eq!(wrapped.kind(), ErrorKind::NotFound);
        assert!(wrapped.to_string().contains("resolving /a/b"));
    }

    #[test]
    fn errno_classification() {
        assert_eq!(
            ErrorImpl::errno_with_op(Errno::NOENT, "open").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ErrorImpl::errno_with_op(Errno::XDEV, "check").kind(),
            ErrorKind::CrossDevice
        );
        assert_eq!(
            ErrorImpl::errno_with_op(Errno::LOOP, "open").kind(),
            ErrorKind::Loop
        );
    }

    #[test]
    fn can_retry_on_eagain() {
        let err: Error = ErrorImpl::TryAgain {
            operation: "check".into(),
        }
        .into();
        assert!(err.can_retry());

        let err: Error = ErrorImpl::NotFound {
            operation: "open".into(),
        }
        .into();
        assert!(!err.can_retry());
    }

    #[test]
    fn maybe_symlink_errno_set() {
        assert!(is_maybe_symlink_errno(Errno::LOOP));
        assert!(is_maybe_symlink_errno(Errno::NOTDIR));
        assert!(!is_maybe_symlink_errno(Errno::NOENT));
    }
}
