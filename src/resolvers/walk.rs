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

//! The emulated resolver: a userspace state machine that walks a path one
//! component at a time, confining the result beneath a root descriptor
//! (spec §4.C "Escape verifier", §4.D "Resolver state machine").
//!
//! This is the fallback used when the platform has no kernel-assisted
//! fast path (see [`super::fastpath`]), or when an audit callback is
//! supplied (the fast path can't report intermediate steps). The walk
//! itself, the two `..` policies, and the symlink-or-not disambiguation are
//! all ported from `nixutil`'s `_open_beneath`/`_check_beneath`.

use std::ffi::OsStr;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

use rustix::fs::Mode;
use rustix::io::Errno;

use crate::error::{is_maybe_symlink_errno, Error, ErrorImpl};
use crate::flags::{OpenFlags, ResolverFlags};
use crate::resolvers::MAX_SYMLINK_TRAVERSALS;
use crate::syscalls;
use crate::utils::{split_path, Component, Cursor, FileIdentity, ParentStack, WorkItem};

/// Callback invoked at each step of the walk. Disables the fast-path
/// adapter when supplied (spec §4.E, §6 "audit").
pub trait Audit {
    /// Called before a component is processed, for every component in the
    /// path -- `/`, `.`, and `..` included, not just ordinary names.
    fn before(&mut self, cursor: BorrowedFd<'_>, component: &OsStr) -> Result<(), Error>;
    /// Called after a symlink has been read, before it is expanded.
    fn symlink(&mut self, cursor: BorrowedFd<'_>, target: &OsStr) -> Result<(), Error>;
}

pub(crate) fn resolve(
    root: BorrowedFd<'_>,
    path: &OsStr,
    final_flags: OpenFlags,
    mode: Mode,
    resolver_flags: ResolverFlags,
    mut audit: Option<&mut dyn Audit>,
) -> Result<OwnedFd, Error> {
    if !syscalls::is_directory(root).map_err(|e| ErrorImpl::errno_with_op(e, "fstat root"))? {
        return Err(ErrorImpl::NotADirectory {
            operation: "open_beneath root".into(),
        }
        .into());
    }

    let root_identity = FileIdentity::of(root)?;
    let no_symlinks = resolver_flags.contains(ResolverFlags::NO_SYMLINKS);
    let remember_parents = resolver_flags.contains(ResolverFlags::REMEMBER_PARENTS);
    let symlink_budget = if no_symlinks { 0 } else { MAX_SYMLINK_TRAVERSALS };

    let mut queue = split_path(path, final_flags)?;
    let mut cursor = Cursor::root(root);
    let mut parent_stack = ParentStack::new();
    let mut escape_pending = false;
    let mut symlink_count = 0u32;

    while let Some(item) = queue.pop_front() {
        let is_last = queue.is_empty();
        let flags = item.flags;

        // Every dequeued component is announced, including `/`, `.` and
        // `..` -- not just ordinary names -- matching the original
        // `_open_beneath`'s unconditional `audit("before", ...)` at the top
        // of its loop (spec §4.D step 1).
        if let Some(hook) = audit.as_deref_mut() {
            hook.before(cursor.as_fd(), component_token(&item.component))?;
        }

        match &item.component {
            Component::Root => {
                cursor.reset_to_root(root);
                parent_stack.clear();
                escape_pending = false;
            }

            Component::CurDir => {
                if is_last && flags != crate::utils::DIR_OPEN_FLAGS {
                    let fd = syscalls::reopen_dot(cursor.as_fd(), flags)
                        .map_err(|e| ErrorImpl::errno_with_op(e, "reopen ."))?;
                    let old = cursor.swap_owned(fd);
                    stash_parent(remember_parents, &mut parent_stack, old);
                }
            }

            Component::ParentDir => {
                handle_dotdot(
                    root,
                    root_identity,
                    remember_parents,
                    &mut cursor,
                    &mut parent_stack,
                    &mut escape_pending,
                    is_last,
                    flags,
                    mode,
                )?;
            }

            Component::Name(name) => {
                if escape_pending {
                    verify_contained(cursor.as_fd(), root_identity)?;
                    escape_pending = false;
                }

                let open_flags = flags | OpenFlags::O_NOFOLLOW;
                match syscalls::openat(cursor.as_fd(), name, open_flags, mode) {
                    Ok(fd) => {
                        // Defend against the O_PATH-without-O_NOFOLLOW-without-
                        // O_DIRECTORY symlink leak some platforms exhibit.
                        let leaky = open_flags.contains(OpenFlags::O_PATH)
                            && !open_flags.contains(OpenFlags::O_NOFOLLOW | OpenFlags::O_DIRECTORY);
                        if leaky
                            && syscalls::is_symlink(&fd)
                                .map_err(|e| ErrorImpl::errno_with_op(e, "fstat"))?
                        {
                            drop(fd);
                            handle_symlink(
                                &mut queue,
                                &mut symlink_count,
                                symlink_budget,
                                no_symlinks,
                                is_last,
                                flags,
                                name,
                                cursor.as_fd(),
                                &mut audit,
                                None,
                            )?;
                            continue;
                        }
                        let old = cursor.swap_owned(fd);
                        stash_parent(remember_parents, &mut parent_stack, old);
                    }
                    Err(errno) if is_maybe_symlink_errno(errno) => {
                        handle_symlink(
                            &mut queue,
                            &mut symlink_count,
                            symlink_budget,
                            no_symlinks,
                            is_last,
                            flags,
                            name,
                            cursor.as_fd(),
                            &mut audit,
                            Some(errno),
                        )?;
                    }
                    Err(errno) => {
                        return Err(ErrorImpl::errno_with_op(errno, "openat").into());
                    }
                }
            }
        }
    }

    if escape_pending {
        verify_contained(cursor.as_fd(), root_identity)?;
    }

    if cursor.is_root() {
        let fd = syscalls::reopen_dot(root, final_flags)
            .map_err(|e| ErrorImpl::errno_with_op(e, "reopen final ."))?;
        Ok(fd)
    } else {
        Ok(cursor.into_owned().expect("non-root cursor must own its fd"))
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_dotdot<'a>(
    root: BorrowedFd<'a>,
    root_identity: FileIdentity,
    remember_parents: bool,
    cursor: &mut Cursor<'a>,
    parent_stack: &mut ParentStack,
    escape_pending: &mut bool,
    is_last: bool,
    flags: OpenFlags,
    mode: Mode,
) -> Result<(), Error> {
    if remember_parents {
        match parent_stack.pop() {
            Some(parent) => {
                if is_last && flags != crate::utils::DIR_OPEN_FLAGS {
                    let fd = syscalls::reopen_dot(parent.as_fd(), flags)
                        .map_err(|e| ErrorImpl::errno_with_op(e, "reopen .."))?;
                    cursor.set_owned(fd);
                } else {
                    cursor.set_owned(parent);
                }
            }
            None => cursor.reset_to_root(root),
        }
    } else {
        let cur_identity = FileIdentity::of(cursor.as_fd())?;
        if cursor.is_root() || cur_identity == root_identity {
            cursor.reset_to_root(root);
            *escape_pending = false;
        } else {
            let open_flags = if is_last { flags } else { crate::utils::DIR_OPEN_FLAGS };
            let fd = syscalls::openat(cursor.as_fd(), OsStr::new(".."), open_flags, mode)
                .map_err(|e| ErrorImpl::errno_with_op(e, "openat .."))?;
            cursor.set_owned(fd);
            *escape_pending = true;
        }
    }
    Ok(())
}

/// The textual form of a component to report through [`Audit::before`].
/// Matches the original `_split_path`'s convention: the root marker and the
/// dot components are reported as their literal tokens, not as the empty
/// string.
fn component_token(component: &Component) -> &OsStr {
    match component {
        Component::Root => OsStr::new("/"),
        Component::CurDir => OsStr::new("."),
        Component::ParentDir => OsStr::new(".."),
        Component::Name(name) => name.as_os_str(),
    }
}

fn stash_parent(remember_parents: bool, parent_stack: &mut ParentStack, old: Cursor<'_>) {
    if remember_parents {
        if let Some(owned) = old.into_owned() {
            parent_stack.push(owned);
        }
    }
    // else: `old` drops here, closing it if it was owned.
}

/// Component C: prove `cursor` lies within the subtree rooted at
/// `root_identity` by walking `..` upward until identities match, failing
/// if the real filesystem root is reached first.
fn verify_contained(cursor: BorrowedFd<'_>, root_identity: FileIdentity) -> Result<(), Error> {
    let mut current: OwnedFd = syscalls::reopen_dot(cursor, crate::utils::DIR_OPEN_FLAGS)
        .map_err(|e| ErrorImpl::errno_with_op(e, "reopen . for verify"))?;
    loop {
        let identity = FileIdentity::of(&current)?;
        if identity == root_identity {
            return Ok(());
        }
        let parent = syscalls::open_parent(current.as_fd())
            .map_err(|e| ErrorImpl::errno_with_op(e, "open .. for verify"))?;
        let parent_identity = FileIdentity::of(&parent)?;
        if parent_identity == identity {
            return Err(ErrorImpl::Escaped {
                operation: "verify containment".into(),
            }
            .into());
        }
        current = parent;
    }
}

/// Component D step 3: the component we tried to open looks like it might
/// be a symlink (either the open failed with one of the "maybe a symlink"
/// errno values, or we detected a path-only leak after success). Read the
/// link, validate it really is one, and splice its expansion into the
/// front of the work queue.
#[allow(clippy::too_many_arguments)]
fn handle_symlink(
    queue: &mut std::collections::VecDeque<WorkItem>,
    symlink_count: &mut u32,
    symlink_budget: u32,
    no_symlinks: bool,
    is_last: bool,
    flags: OpenFlags,
    name: &std::ffi::OsStr,
    cursor: BorrowedFd<'_>,
    audit: &mut Option<&mut dyn Audit>,
    open_errno: Option<Errno>,
) -> Result<(), Error> {
    match syscalls::readlinkat(cursor, name) {
        Ok(target) => {
            if no_symlinks {
                return Err(ErrorImpl::SymlinkLoop {
                    operation: "readlinkat".into(),
                }
                .into());
            }
            if let Some(hook) = audit.as_deref_mut() {
                hook.symlink(cursor, &target)?;
            }
            *symlink_count += 1;
            let nofollow_on_final = is_last && flags.contains(OpenFlags::O_NOFOLLOW);
            if *symlink_count > symlink_budget || nofollow_on_final {
                return Err(ErrorImpl::SymlinkLoop {
                    operation: "readlinkat".into(),
                }
                .into());
            }
            let expansion = split_path(&target, flags)?;
            for sub in expansion.into_iter().rev() {
                queue.push_front(sub);
            }
            Ok(())
        }
        Err(Errno::INVAL) => {
            // Not actually a symlink: if the original open failed with
            // ENOTDIR, that was a genuine non-directory-in-path error.
            // Otherwise the OS contradicted itself between open and
            // readlink -- treat it as a concurrent-rename race.
            if open_errno == Some(Errno::NOTDIR) {
                Err(ErrorImpl::NotADirectory {
                    operation: "openat".into(),
                }
                .into())
            } else {
                Err(ErrorImpl::TryAgain {
                    operation: "readlinkat".into(),
                }
                .into())
            }
        }
        Err(errno) => Err(ErrorImpl::errno_with_op(errno, "readlinkat").into()),
    }
}
