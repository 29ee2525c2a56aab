use std::io::{self, Write};
use std::process::{Child, Command, Stdio};

use super::{dot, Format};
use crate::tree::CallTree;
use crate::Error;

/// The Graphviz layout command.
const DOT_COMMAND: &str = "dot";

/// Lay out the DOT rendering of `tree` with Graphviz and write the resulting image.
pub(super) fn write<W>(format: Format, tree: &CallTree, mut writer: W) -> Result<(), Error>
where
    W: Write,
{
    let mut graph = Vec::new();
    dot::write(tree, &mut graph)?;

    let mut child = spawn(DOT_COMMAND, format)
        .map_err(|e| Error::Dot(format!("could not run `{}`: {}", DOT_COMMAND, e)))?;

    // dot reads the whole graph before it lays anything out, so stdin can be written in full
    // before stdout is read
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(&graph),
        None => return Err(Error::Dot("no stdin handle for `dot`".to_owned())),
    };

    let output = child
        .wait_with_output()
        .map_err(|e| Error::Dot(format!("waiting for `{}` failed: {}", DOT_COMMAND, e)))?;
    match written {
        Ok(()) => {}
        // `dot` exiting early closes the pipe; its exit status says why
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
        Err(e) => return Err(Error::Dot(format!("writing the graph failed: {}", e))),
    }

    if !output.status.success() {
        return Err(Error::Dot(format!(
            "`{} -T{}` exited with {}",
            DOT_COMMAND, format, output.status
        )));
    }

    debug!("graphviz produced {} bytes of {}", output.stdout.len(), format);
    writer.write_all(&output.stdout)?;
    writer.flush()?;
    Ok(())
}

/// Start `command -T<format>` with piped stdin and stdout.
///
/// Stderr is inherited: nothing drains it while stdin is being written, so a pipe could fill up
/// and stall the child.
fn spawn(command: &str, format: Format) -> io::Result<Child> {
    Command::new(command)
        .arg(format!("-T{}", format))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn only_stdin_and_stdout_are_piped() {
        let mut child = spawn("true", Format::Svg).unwrap();
        assert!(child.stdin.is_some());
        assert!(child.stdout.is_some());
        assert!(child.stderr.is_none());
        drop(child.stdin.take());
        child.wait().unwrap();
    }

    #[test]
    fn missing_command() {
        let err = spawn("grindtree-no-such-command", Format::Png).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
