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

#![cfg(unix)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::all)]
#![deny(missing_debug_implementations)]

//! `beneath` opens a path confined beneath a nominated root directory, on
//! POSIX filesystems, resistant to symlink escapes and to concurrent-rename
//! races on `..`.
//!
//! # Example
//!
//! ```no_run
//! # use beneath::{error::Error, flags::OpenFlags, Root, OpenOptions};
//! # use rustix::fs::Mode;
//! # fn main() -> Result<(), Error> {
//! let root = Root::open("/path/to/root")?;
//! let file = root.open_subpath(
//!     "etc/passwd",
//!     OpenFlags::O_RDONLY,
//!     Mode::empty(),
//!     OpenOptions::default(),
//! )?;
//! # let _ = file;
//! # Ok(())
//! # }
//! ```
//!
//! The returned descriptor is guaranteed to lie within the subtree rooted
//! at `/path/to/root`, even if another process is concurrently renaming
//! directories along the way.
//!
//! # Platform support
//!
//! | Feature | Linux | Other POSIX |
//! |---|---|---|
//! | Emulated resolver (symlink/`..` safe walk) | yes | yes |
//! | Kernel fast path (`openat2` `RESOLVE_IN_ROOT`) | yes (5.6+, else declines) | no |
//! | Direct descriptor-to-path lookup (`/proc/self/fd`) | yes | no (falls back to the portable reverse walk) |

pub mod error;
pub mod flags;

mod recover;
mod resolvers;
mod root;
mod syscalls;
mod utils;

pub use recover::recover_fd_path;
pub use resolvers::Audit;
pub use root::{open_beneath, OpenOptions, Root};

#[cfg(test)]
mod tests;
