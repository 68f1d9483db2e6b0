//! Script run inside the terminal window.
//!
//! The script reads the request artifact, shows the reason and all questions up
//! front, then collects one line per question with numbered prompts and writes the
//! response artifact. Rendering is plain `{{name}}` substitution into a fixed
//! template; the only per-session values are the two artifact paths.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::human_input::workspace::SessionWorkspace;

/// Column width used when wrapping the reason and questions
pub const WRAP_WIDTH: usize = 60;

/// Seconds the confirmation stays visible before the window closes
pub const CLOSE_DELAY_SECS: u64 = 3;

/// Interpreter family the front-end script is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptFlavor {
    /// Python 3 (macOS, Linux and other Unix systems)
    Python,
    /// Windows PowerShell or PowerShell 7
    PowerShell,
}

impl ScriptFlavor {
    /// Flavor used on the current host
    pub fn native() -> Self {
        if cfg!(windows) {
            ScriptFlavor::PowerShell
        } else {
            ScriptFlavor::Python
        }
    }

    /// File name of the script inside the session directory
    pub fn file_name(&self) -> &'static str {
        match self {
            ScriptFlavor::Python => "ask.py",
            ScriptFlavor::PowerShell => "ask.ps1",
        }
    }

    /// Default interpreter program
    pub fn interpreter(&self) -> &'static str {
        match self {
            ScriptFlavor::Python => "python3",
            ScriptFlavor::PowerShell => "powershell.exe",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            ScriptFlavor::Python => PYTHON_TEMPLATE,
            ScriptFlavor::PowerShell => POWERSHELL_TEMPLATE,
        }
    }

    /// Quote `value` as a string literal for this interpreter
    pub fn quote(&self, value: &str) -> Result<String> {
        match self {
            // A JSON string literal is also a valid Python string literal.
            ScriptFlavor::Python => serde_json::to_string(value)
                .map_err(|e| Error::Encode(format!("failed to quote path: {}", e))),
            ScriptFlavor::PowerShell => Ok(powershell_quote(value)),
        }
    }
}

fn powershell_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        // PowerShell also treats typographic single quotes as quote characters.
        if matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}') {
            quoted.push(c);
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Render the front-end script for the given artifact paths.
///
/// `pid_path` is where the script records its own process id so the exchange can
/// terminate it even when the terminal runs it outside the launcher's process tree.
pub fn render_script(
    flavor: ScriptFlavor,
    request_path: &Path,
    response_path: &Path,
    pid_path: &Path,
) -> Result<String> {
    let values = [
        ("wrap_width", WRAP_WIDTH.to_string()),
        ("close_delay", CLOSE_DELAY_SECS.to_string()),
        ("pid_path", flavor.quote(&pid_path.to_string_lossy())?),
        ("request_path", flavor.quote(&request_path.to_string_lossy())?),
        ("response_path", flavor.quote(&response_path.to_string_lossy())?),
    ];
    Ok(substitute(flavor.template(), &values))
}

/// Single pass over `template`: substituted values are never scanned again.
fn substitute(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after.find("}}").and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (value, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Write the rendered script into the session directory and return its path
pub async fn write_script(workspace: &SessionWorkspace, flavor: ScriptFlavor) -> Result<PathBuf> {
    let script = render_script(
        flavor,
        &workspace.request_path(),
        &workspace.response_path(),
        &workspace.pid_path(),
    )?;
    let path = workspace.file_path(flavor.file_name());

    tokio::fs::write(&path, script).await.map_err(|e| {
        Error::Encode(format!("failed to write script {}: {}", path.display(), e))
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(|e| {
                Error::Encode(format!(
                    "failed to mark script {} executable: {}",
                    path.display(),
                    e
                ))
            })?;
    }

    debug!(path = %path.display(), ?flavor, "Wrote front-end script");
    Ok(path)
}

const PYTHON_TEMPLATE: &str = r#"import json
import os
import sys
import textwrap
import time

PID_PATH = {{pid_path}}
REQUEST_PATH = {{request_path}}
RESPONSE_PATH = {{response_path}}
WRAP_WIDTH = {{wrap_width}}
CLOSE_DELAY = {{close_delay}}


def wrap(text, first="", rest=""):
    lines = []
    for paragraph in text.splitlines() or [""]:
        chunk = textwrap.wrap(
            paragraph, WRAP_WIDTH, initial_indent=first, subsequent_indent=rest
        )
        lines.extend(chunk or [first.rstrip()])
        first = rest
    return lines


def main():
    with open(PID_PATH, "w", encoding="utf-8") as handle:
        handle.write(str(os.getpid()))

    with open(REQUEST_PATH, encoding="utf-8") as handle:
        request = json.load(handle)
    questions = request["questions"]

    print("=" * WRAP_WIDTH)
    print("INPUT REQUESTED")
    print("=" * WRAP_WIDTH)
    print()
    for line in wrap(request["reason"]):
        print(line)
    print()
    print("Questions:")
    for number, question in enumerate(questions, 1):
        prefix = "%d. " % number
        for line in wrap(question, prefix, " " * len(prefix)):
            print(line)
    print()
    print("Answer each question and press Enter. Leave a line empty to skip it.")
    print("-" * WRAP_WIDTH)

    answers = []
    for number, question in enumerate(questions, 1):
        try:
            answer = input("%d> " % number)
        except (EOFError, KeyboardInterrupt):
            print()
            print("Input closed, no answers were recorded.")
            return 1
        answers.append({"question": question, "answer": answer})

    partial = RESPONSE_PATH + ".partial"
    with open(partial, "w", encoding="utf-8") as handle:
        json.dump({"answers": answers}, handle, ensure_ascii=False, indent=2)
    os.replace(partial, RESPONSE_PATH)

    print()
    print("Thank you! Your answers were sent back.")
    print("This window closes in %d seconds." % CLOSE_DELAY)
    time.sleep(CLOSE_DELAY)
    return 0


if __name__ == "__main__":
    sys.exit(main())
"#;

const POWERSHELL_TEMPLATE: &str = r#"$ErrorActionPreference = 'Stop'
$PidPath = {{pid_path}}
$RequestPath = {{request_path}}
$ResponsePath = {{response_path}}
$WrapWidth = {{wrap_width}}
$CloseDelay = {{close_delay}}

function Write-Wrapped([string]$Text, [string]$First = '', [string]$Rest = '') {
    $prefix = $First
    foreach ($paragraph in ($Text -split "`r?`n")) {
        $line = ''
        foreach ($word in ($paragraph -split '\s+' | Where-Object { $_ -ne '' })) {
            if ($line -eq '') {
                $line = $word
            }
            elseif (($prefix.Length + $line.Length + 1 + $word.Length) -gt $WrapWidth) {
                Write-Host ($prefix + $line)
                $prefix = $Rest
                $line = $word
            }
            else {
                $line = "$line $word"
            }
        }
        Write-Host ($prefix + $line)
        $prefix = $Rest
    }
}

[System.IO.File]::WriteAllText($PidPath, [string]$PID)

$request = Get-Content -LiteralPath $RequestPath -Raw -Encoding UTF8 | ConvertFrom-Json
$questions = @($request.questions)

Write-Host ('=' * $WrapWidth)
Write-Host 'INPUT REQUESTED'
Write-Host ('=' * $WrapWidth)
Write-Host ''
Write-Wrapped $request.reason
Write-Host ''
Write-Host 'Questions:'
for ($i = 0; $i -lt $questions.Count; $i++) {
    $prefix = "$($i + 1). "
    Write-Wrapped $questions[$i] $prefix (' ' * $prefix.Length)
}
Write-Host ''
Write-Host 'Answer each question and press Enter. Leave a line empty to skip it.'
Write-Host ('-' * $WrapWidth)

$answers = @()
for ($i = 0; $i -lt $questions.Count; $i++) {
    Write-Host -NoNewline "$($i + 1)> "
    $answer = [Console]::ReadLine()
    if ($null -eq $answer) {
        Write-Host ''
        Write-Host 'Input closed, no answers were recorded.'
        exit 1
    }
    $answers += [pscustomobject]@{ question = [string]$questions[$i]; answer = $answer }
}

$json = ConvertTo-Json -InputObject @{ answers = @($answers) } -Depth 4
$partial = "$ResponsePath.partial"
[System.IO.File]::WriteAllText($partial, $json, (New-Object System.Text.UTF8Encoding($false)))
Move-Item -LiteralPath $partial -Destination $ResponsePath -Force

Write-Host ''
Write-Host 'Thank you! Your answers were sent back.'
Write-Host "This window closes in $CloseDelay seconds."
Start-Sleep -Seconds $CloseDelay
exit 0
"#;
