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

//! The path splitter (spec §4.A): turns a path into an ordered queue of
//! work items, purely syntactically -- no filesystem access happens here.
//!
//! Grounded on `nixutil`'s `_split_path`: the root marker is emitted
//! separately from the remaining components, only the last component
//! carries the caller's requested open flags, and a trailing slash forces
//! `O_DIRECTORY` onto whatever that last component turns out to be.

use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;

use crate::error::{Error, ErrorImpl};
use crate::flags::OpenFlags;

/// The flags every intermediate (non-final) component is opened with:
/// path-only, no-follow, must-be-a-directory, close-on-exec, no controlling
/// tty (spec §3 "Directory-open flag set", §4.D "No-controlling-tty").
pub(crate) const DIR_OPEN_FLAGS: OpenFlags = OpenFlags::O_PATH
    .union(OpenFlags::O_NOFOLLOW)
    .union(OpenFlags::O_DIRECTORY)
    .union(OpenFlags::O_CLOEXEC)
    .union(OpenFlags::O_NOCTTY);

/// One component of a work item (spec §3 "Work item").
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Component {
    /// The path started with `/`: reset to the confinement root.
    Root,
    /// `.`
    CurDir,
    /// `..`
    ParentDir,
    /// An ordinary name, no separators.
    Name(OsString),
}

/// A single step in the resolver's work queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkItem {
    pub(crate) component: Component,
    pub(crate) flags: OpenFlags,
}

/// Split `path` into an ordered queue of work items. `final_flags` are the
/// flags the *last* component of `path` should be opened with; a trailing
/// `/` in `path` additionally forces `O_DIRECTORY` onto them.
pub(crate) fn split_path(
    path: &OsStr,
    final_flags: OpenFlags,
) -> Result<VecDeque<WorkItem>, Error> {
    let bytes = path.as_bytes();
    if bytes.is_empty() {
        return Err(ErrorImpl::NotFound {
            operation: "split path".into(),
        }
        .into());
    }

    let is_absolute = bytes[0] == b'/';
    let trailing_slash = bytes.len() > 1 && *bytes.last().unwrap() == b'/';

    let names: Vec<&[u8]> = bytes
        .split(|&b| b == b'/')
        .filter(|part| !part.is_empty())
        .collect();

    let mut items = VecDeque::with_capacity(names.len() + 1);

    if is_absolute {
        let flags = if names.is_empty() {
            augment_trailing(final_flags, trailing_slash)
        } else {
            DIR_OPEN_FLAGS
        };
        items.push_back(WorkItem {
            component: Component::Root,
            flags,
        });
    }

    let last_index = names.len().saturating_sub(1);
    for (i, name) in names.iter().enumerate() {
        let is_last = i == last_index;
        let flags = if is_last {
            augment_trailing(final_flags, trailing_slash)
        } else {
            DIR_OPEN_FLAGS
        };
        let component = match *name {
            b"." => Component::CurDir,
            b".." => Component::ParentDir,
            name => Component::Name(OsStr::from_bytes(name).to_os_string()),
        };
        items.push_back(WorkItem { component, flags });
    }

    Ok(items)
}

fn augment_trailing(flags: OpenFlags, trailing_slash: bool) -> OpenFlags {
    if trailing_slash {
        flags | OpenFlags::O_DIRECTORY
    } else {
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(items: &VecDeque<WorkItem>) -> Vec<Component> {
        items.iter().map(|i| i.component.clone()).collect()
    }

    #[test]
    fn relative_simple() {
        let items = split_path(OsStr::new("a/b/c"), OpenFlags::O_RDONLY).unwrap();
        assert_eq!(
            names(&items),
            vec![
                Component::Name("a".into()),
                Component::Name("b".into()),
                Component::Name("c".into()),
            ]
        );
        assert_eq!(items[0].flags, DIR_OPEN_FLAGS);
        assert_eq!(items[2].flags, OpenFlags::O_RDONLY);
    }

    #[test]
    fn absolute_root_marker() {
        let items = split_path(OsStr::new("/a/b"), OpenFlags::O_RDONLY).unwrap();
        assert_eq!(
            names(&items),
            vec![
                Component::Root,
                Component::Name("a".into()),
                Component::Name("b".into()),
            ]
        );
        assert_eq!(items[0].flags, DIR_OPEN_FLAGS);
    }

    #[test]
    fn bare_root() {
        let items = split_path(OsStr::new("/"), OpenFlags::O_RDONLY).unwrap();
        assert_eq!(names(&items), vec![Component::Root]);
        assert!(items[0].flags.contains(OpenFlags::O_DIRECTORY));
    }

    #[test]
    fn trailing_slash_forces_directory() {
        let items = split_path(OsStr::new("a/b/"), OpenFlags::O_RDONLY).unwrap();
        assert!(items.back().unwrap().flags.contains(OpenFlags::O_DIRECTORY));
    }

    #[test]
    fn collapses_repeated_separators() {
        let items = split_path(OsStr::new("a//b///c"), OpenFlags::O_RDONLY).unwrap();
        assert_eq!(
            names(&items),
            vec![
                Component::Name("a".into()),
                Component::Name("b".into()),
                Component::Name("c".into()),
            ]
        );
    }

    #[test]
    fn dot_and_dotdot_recognized() {
        let items = split_path(OsStr::new("./a/../b"), OpenFlags::O_RDONLY).unwrap();
        assert_eq!(
            names(&items),
            vec![
                Component::CurDir,
                Component::Name("a".into()),
                Component::ParentDir,
                Component::Name("b".into()),
            ]
        );
    }

    #[test]
    fn empty_path_is_not_found() {
        let err = split_path(OsStr::new(""), OpenFlags::O_RDONLY).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }
}
