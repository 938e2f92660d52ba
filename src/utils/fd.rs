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

//! The resolver's "current directory" cursor (spec §3 "Descriptor cursor",
//! §4.B "Descriptor manager").
//!
//! A [`Cursor`] is either the caller's borrowed root descriptor (never
//! closed by us) or a descriptor the walker opened itself (closed on drop),
//! the same borrowed-or-owned split as the teacher's `MaybeOwnedFd`,
//! specialized to the one case the resolver actually needs.

use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

/// The walker's current lookup base: either borrowed from the caller (the
/// root) or owned by the walker (everything opened during the walk).
#[derive(Debug)]
pub(crate) enum Cursor<'root> {
    Root(BorrowedFd<'root>),
    Owned(OwnedFd),
}

impl<'root> Cursor<'root> {
    pub(crate) fn root(fd: BorrowedFd<'root>) -> Self {
        Self::Root(fd)
    }

    pub(crate) fn is_root(&self) -> bool {
        matches!(self, Self::Root(_))
    }

    /// Replace the cursor with a freshly-opened, walker-owned descriptor,
    /// dropping (closing) whatever this cursor previously owned.
    pub(crate) fn set_owned(&mut self, fd: OwnedFd) {
        *self = Self::Owned(fd);
    }

    /// Reset the cursor back to the root descriptor, dropping whatever it
    /// previously owned.
    pub(crate) fn reset_to_root(&mut self, root: BorrowedFd<'root>) {
        *self = Self::Root(root);
    }

    /// Replace the cursor with a freshly-opened descriptor, returning the
    /// previous cursor value instead of dropping it -- used when the
    /// previous descriptor needs to be pushed onto the parent stack rather
    /// than closed (spec §4.D, "remember-parents" policy).
    pub(crate) fn swap_owned(&mut self, fd: OwnedFd) -> Self {
        std::mem::replace(self, Self::Owned(fd))
    }

    /// Consume the cursor, handing back the owned descriptor if there is
    /// one. Used at the end of a successful walk (spec §4.D "final result").
    pub(crate) fn into_owned(self) -> Option<OwnedFd> {
        match self {
            Self::Root(_) => None,
            Self::Owned(fd) => Some(fd),
        }
    }
}

impl AsFd for Cursor<'_> {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match self {
            Self::Root(fd) => fd.as_fd(),
            Self::Owned(fd) => fd.as_fd(),
        }
    }
}

/// Owned stack of parent descriptors used by the "remember-parents" `..`
/// policy (spec §3 "Parent stack", §4.D). All members are walker-owned and
/// are closed when the stack (or an individual popped entry) is dropped.
#[derive(Debug, Default)]
pub(crate) struct ParentStack(Vec<OwnedFd>);

impl ParentStack {
    pub(crate) fn new() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push(&mut self, fd: OwnedFd) {
        self.0.push(fd);
    }

    pub(crate) fn pop(&mut self) -> Option<OwnedFd> {
        self.0.pop()
    }

    /// Drop every remaining owned descriptor (invariant 1, spec §3): used
    /// when a `/` component resets the walk back to the root.
    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn cursor_root_is_not_owned() {
        let root = File::open(".").unwrap();
        let cursor = Cursor::root(root.as_fd());
        assert!(cursor.is_root());
        assert!(cursor.into_owned().is_none());
    }

    #[test]
    fn cursor_owned_roundtrips() {
        let root = File::open(".").unwrap();
        let mut cursor = Cursor::root(root.as_fd());
        let owned: OwnedFd = File::open(".").unwrap().into();
        cursor.set_owned(owned);
        assert!(!cursor.is_root());
        assert!(cursor.into_owned().is_some());
    }

    #[test]
    fn parent_stack_push_pop() {
        let mut stack = ParentStack::new();
        assert!(stack.is_empty());
        stack.push(File::open(".").unwrap().into());
        assert!(!stack.is_empty());
        assert!(stack.pop().is_some());
        assert!(stack.is_empty());
        assert!(stack.pop().is_none());
    }
}
