use std::io::{self, BufRead, Write};

use viewer::render::render_text;
use viewer::{Dispatch, KeyCode, KeyEvent, Session, Viewer};

use crate::status_line;

const HELP: &str = "\
commands:
  n, <enter>   next section
  p            previous section
  k KEY        press KEY (e.g. ArrowRight, Shift+Space)
  b            back
  f            forward
  g N          open fragment #N
  c HREF       click the link to HREF
  q            quit";

/// Drive `viewer` from line commands on `input` until `q` or end of input,
/// printing the view after each command.
pub fn run<R: BufRead, W: Write>(mut viewer: Viewer<Session>, input: R, mut out: W) -> io::Result<()> {
    print_view(&viewer, &mut out)?;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        let (command, argument) = match line.split_once(char::is_whitespace) {
            Some((command, argument)) => (command, argument.trim()),
            None => (line, ""),
        };

        let result = match command {
            "" | "n" => Ok(Some(viewer.key(KeyEvent::new(KeyCode::Enter)))),
            "p" => Ok(Some(viewer.key(KeyEvent::new(KeyCode::ArrowLeft)))),
            "k" => argument
                .parse::<KeyEvent>()
                .map(|key| Some(viewer.key(key)))
                .map_err(|e| e.to_string()),
            "b" => Ok(viewer.back()),
            "f" => Ok(viewer.forward()),
            "g" => Ok(Some(viewer.open_fragment(argument))),
            "c" => viewer.click_link(argument).map(Some).map_err(|e| e.to_string()),
            "q" => break,
            "h" | "?" => {
                writeln!(out, "{}", HELP)?;
                continue;
            }
            other => Err(format!("unknown command '{}' (h for help)", other)),
        };

        match result {
            Ok(Some(Dispatch::Ignored)) | Ok(None) => writeln!(out, "(nothing to do)")?,
            Ok(Some(_)) => print_view(&viewer, &mut out)?,
            Err(e) => writeln!(out, "error: {}", e)?,
        }
    }
    Ok(())
}

fn print_view<W: Write>(viewer: &Viewer<Session>, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", status_line(viewer))?;
    writeln!(out)?;
    write!(out, "{}", render_text(viewer.dom()))?;
    out.flush()
}
