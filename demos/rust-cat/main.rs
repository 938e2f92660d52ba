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

//! A small demonstration binary: opens a path confined beneath a root
//! directory and prints it, the same way `cat` would, except that
//! `unsafe-path` is never trusted to stay inside `root` on its own.
//!
//! Usage: `rust-cat <root> <unsafe-path>`

use std::io::{prelude::*, BufReader};

use anyhow::{Context, Error};
use rustix::fs::Mode;

use beneath::{flags::OpenFlags, OpenOptions, Root};

fn main() -> Result<(), Error> {
    let mut args = std::env::args_os().skip(1);
    let root_path = args.next().context("required ROOT argument not provided")?;
    let unsafe_path = args
        .next()
        .context("required UNSAFE-PATH argument not provided")?;

    let root = Root::open(&root_path).context("open root failed")?;
    let file = root
        .open_subpath(
            &unsafe_path,
            OpenFlags::O_RDONLY,
            Mode::empty(),
            OpenOptions::default(),
        )
        .context("open unsafe path in root")?;

    let reader = BufReader::new(file);
    for line in reader.lines() {
        println!("{}", line.context("read lines")?);
    }
    Ok(())
}
