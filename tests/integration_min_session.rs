// Drives the compiled binary through a PTY: answers the first-run storage
// prompt, starts a game from the menu, aborts it and quits.
//
// Notes:
// - Requires a TTY; uses expectrl which allocates a pseudo terminal.
// - Unix-only and ignored by default.
// - Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn menu_game_abort_and_quit() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempfile::tempdir()?;
    let bin = assert_cmd::cargo::cargo_bin("mindgames");
    let cmd = format!("env HOME={} {}", home.path().display(), bin.display());

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));

    // necessary storage only
    p.send("n")?;
    std::thread::sleep(Duration::from_millis(100));

    // start the first game, then abort back to the menu
    p.send("1")?;
    std::thread::sleep(Duration::from_millis(200));
    p.send("\x1b")?;
    std::thread::sleep(Duration::from_millis(100));

    p.send("q")?;
    p.expect(Eof)?;
    Ok(())
}
