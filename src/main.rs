/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use cerulean::{Engine, EngineCommand};
use clap::error::{Error as ClapError, ErrorKind};

fn main() {
    let mut engine = Engine::new();

    // Skip the executable name
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    // Any arguments are executed as a single command before reading from `stdin`
    if !args.is_empty() {
        match args.join(" ").parse::<EngineCommand>() {
            Ok(cmd) => {
                if let Err(e) = engine.send_command(cmd) {
                    eprintln!("{e:#}");
                }
            }

            // Edge case: `--help` and `--version` are both "error" cases according to Clap
            Err(e) => match e.downcast_ref::<ClapError>() {
                Some(clap_err)
                    if matches!(
                        clap_err.kind(),
                        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
                    ) =>
                {
                    println!("{clap_err}")
                }

                _ => eprintln!("ERROR on input {args:?}:\n{e:#}"),
            },
        }
    }

    if let Err(e) = engine.run() {
        eprintln!("{} encountered an error: {e:#}", env!("CARGO_PKG_NAME"));
    }
}
