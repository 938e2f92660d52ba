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

//! Crate-level integration tests covering the numbered scenarios and
//! invariants of the confinement contract (spec §8) that don't fit neatly
//! alongside a single module.

use std::ffi::OsStr;
use std::fs;
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::fs::symlink;

use pretty_assertions::assert_eq;
use rustix::fs::Mode;
use tempfile::TempDir;

use crate::error::{Error, ErrorKind};
use crate::flags::OpenFlags;
use crate::{open_beneath, recover_fd_path, Audit, OpenOptions, Root};

/// Audits a single walk, renaming `from` to `to` the first time an ordinary
/// component named `trigger` is about to be opened. Models the "cooperating
/// audit callback" race in spec §8 scenario 6: the rename happens inside
/// our own call stack, at exactly the window a real concurrent attacker
/// would need to win.
struct RenameOnceBefore {
    from: std::path::PathBuf,
    to: std::path::PathBuf,
    trigger: std::ffi::OsString,
    done: bool,
}

impl Audit for RenameOnceBefore {
    fn before(&mut self, _cursor: BorrowedFd<'_>, component: &OsStr) -> Result<(), Error> {
        if !self.done && component == self.trigger.as_os_str() {
            fs::rename(&self.from, &self.to).expect("race rename must succeed in test setup");
            self.done = true;
        }
        Ok(())
    }

    fn symlink(&mut self, _cursor: BorrowedFd<'_>, _target: &OsStr) -> Result<(), Error> {
        Ok(())
    }
}

/// Stateless policy: opening `..` is a live lookup against the current
/// filesystem state, so racing `a`'s parent out from under the walk must be
/// caught by the escape verifier.
#[test]
fn race_dotdot_escape_is_caught_under_stateless_policy() {
    let root_dir = TempDir::new().unwrap();
    let outside_dir = TempDir::new().unwrap();
    fs::create_dir_all(root_dir.path().join("a/b")).unwrap();

    let root = Root::open(root_dir.path()).unwrap();
    let mut hook = RenameOnceBefore {
        from: root_dir.path().join("a"),
        to: outside_dir.path().join("a"),
        trigger: "b".into(),
        done: false,
    };

    let err = root
        .open_subpath(
            OsStr::new("a/b/../../x"),
            OpenFlags::O_RDONLY,
            Mode::empty(),
            OpenOptions {
                audit: Some(&mut hook),
                ..Default::default()
            },
        )
        .unwrap_err();

    assert!(hook.done, "race window was never exercised");
    assert_eq!(err.kind(), ErrorKind::CrossDevice);
}

/// Remember-parents policy: `..` is satisfied from the walker's own stack
/// of descriptors it already opened, not from a live lookup, so the same
/// race does not escape (though the final file still won't exist, since
/// the rename really did move `a` away).
#[test]
fn race_dotdot_is_not_exploitable_under_remember_parents_policy() {
    let root_dir = TempDir::new().unwrap();
    let outside_dir = TempDir::new().unwrap();
    fs::create_dir_all(root_dir.path().join("a/b")).unwrap();

    let root = Root::open(root_dir.path()).unwrap();
    let mut hook = RenameOnceBefore {
        from: root_dir.path().join("a"),
        to: outside_dir.path().join("a"),
        trigger: "b".into(),
        done: false,
    };

    let err = root
        .open_subpath(
            OsStr::new("a/b/../../x"),
            OpenFlags::O_RDONLY,
            Mode::empty(),
            OpenOptions {
                remember_parents: true,
                audit: Some(&mut hook),
                ..Default::default()
            },
        )
        .unwrap_err();

    assert!(hook.done, "race window was never exercised");
    // The walk never leaves the root's descriptor lineage, so the failure
    // is an ordinary missing-file error, not an escape.
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn trailing_slash_on_regular_file_is_not_a_directory() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("b"), b"hi").unwrap();

    let root = Root::open(tmp.path()).unwrap();
    let err = root
        .open_subpath(
            OsStr::new("b/"),
            OpenFlags::O_RDONLY,
            Mode::empty(),
            OpenOptions::default(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotADirectory);
}

#[test]
fn relative_symlink_chain_resolves() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("a/e")).unwrap();
    fs::write(tmp.path().join("b"), b"chained").unwrap();
    symlink("b", tmp.path().join("c")).unwrap();
    symlink("a/e", tmp.path().join("f")).unwrap();

    let root = Root::open(tmp.path()).unwrap();
    let mut file = root
        .open_subpath(
            OsStr::new("c"),
            OpenFlags::O_RDONLY,
            Mode::empty(),
            OpenOptions::default(),
        )
        .unwrap();
    use std::io::Read;
    let mut contents = String::new();
    file.read_to_string(&mut contents).unwrap();
    assert_eq!(contents, "chained");

    // "f" -> "a/e" must resolve to a directory, not error out.
    let dir_fd = root
        .open_subpath(
            OsStr::new("f"),
            OpenFlags::O_DIRECTORY | OpenFlags::O_PATH,
            Mode::empty(),
            OpenOptions::default(),
        )
        .unwrap();
    drop(dir_fd);
}

#[test]
fn recover_fd_path_reflects_rename() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("old")).unwrap();
    let fd = fs::File::open(tmp.path().join("old")).unwrap();

    fs::rename(tmp.path().join("old"), tmp.path().join("new")).unwrap();

    let recovered = recover_fd_path(&fd).unwrap();
    assert_eq!(
        recovered.canonicalize().unwrap(),
        tmp.path().join("new").canonicalize().unwrap()
    );
}

#[test]
fn open_beneath_free_function_uses_explicit_root() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("b"), b"direct").unwrap();
    let root_fd = fs::File::open(tmp.path()).unwrap();

    let fd = open_beneath(
        OsStr::new("b"),
        OpenFlags::O_RDONLY,
        Mode::empty(),
        Some(root_fd.as_fd()),
        OpenOptions::default(),
    )
    .unwrap();
    drop(fd);
}
