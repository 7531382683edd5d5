//! The interactive prompt flow.
//!
//! A [`Session`] asks for a message and an image name, writes the message page, encodes a
//! `file://` link to that page, and optionally encodes a second symbol for a URL where the
//! page is hosted. Rounds repeat for as long as the user asks for another one.
//!
//! Input and output are generic so the whole flow can be driven from memory.

use std::io::{BufRead, Write};
use std::path::{Path, MAIN_SEPARATOR};

use tracing::debug;

use crate::config::SessionConfig;
use crate::document::{DocumentRenderer, Message};
use crate::error::{Error, Result};
use crate::symbol::SymbolEncoder;

const RULE_WIDTH: usize = 60;

/// Returns the image name to use for a prompt answer: the trimmed answer, or `default` when
/// it is empty, with `.png` appended unless already present.
///
/// ```rust
/// use qrnote::session::normalize_image_name;
///
/// assert_eq!(normalize_image_name("mycode", "qr_code.png"), "mycode.png");
/// assert_eq!(normalize_image_name("  ", "qr_code.png"), "qr_code.png");
/// ```
pub fn normalize_image_name(answer: &str, default: &str) -> String {
    let name = match answer.trim() {
        "" => default,
        name => name,
    };
    if name.ends_with(".png") {
        name.to_string()
    } else {
        format!("{name}.png")
    }
}

/// Builds a `file:///` URI for `path` with platform separators turned into `/`.
///
/// An absolute Unix path keeps a single slash after the scheme's `///`.
pub fn file_uri(path: &Path) -> String {
    // Plain `file:///` + path would give `file:////tmp/...` for absolute Unix paths; the
    // leading slash is dropped so the URI has the usual three.
    let normalized = path.to_string_lossy().replace(MAIN_SEPARATOR, "/");
    format!("file:///{}", normalized.trim_start_matches('/'))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

enum Round {
    Again,
    Done,
}

/// One interactive run over an input and an output stream.
pub struct Session<R, W> {
    config: SessionConfig,
    renderer: DocumentRenderer,
    encoder: SymbolEncoder,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(config: SessionConfig, input: R, output: W) -> Self {
        let encoder = SymbolEncoder::new(config.symbol);
        Self {
            config,
            renderer: DocumentRenderer::new(),
            encoder,
            input,
            output,
        }
    }

    /// Consumes the session, returning the output stream.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs rounds until the user declines another one or gives an empty message.
    ///
    /// # Errors
    ///
    /// Encoding and file errors end the session. [`Error::InputClosed`] is returned when the
    /// input reaches end of file at a prompt; callers treat it as an error, not as a request to
    /// quit.
    pub fn run(&mut self) -> Result<()> {
        let mut round: usize = 1;
        loop {
            debug!(round, "starting round");
            match self.run_round()? {
                Round::Again => {
                    writeln!(self.output, "\n")?;
                    round += 1;
                }
                Round::Done => return Ok(()),
            }
        }
    }

    fn run_round(&mut self) -> Result<Round> {
        self.rule('=')?;
        writeln!(self.output, "QR CODE GENERATOR WITH POPUP EFFECT")?;
        self.rule('=')?;

        let text = self.ask("\nEnter the text for your popup message:")?;
        let message = match Message::new(text) {
            Ok(message) => message,
            Err(Error::EmptyMessage) => {
                writeln!(self.output, "Error: {}", Error::EmptyMessage)?;
                return Ok(Round::Done);
            }
            Err(e) => return Err(e),
        };

        let question = format!(
            "\nEnter QR code filename (press Enter for '{}'):",
            self.config.image_name
        );
        let answer = self.ask(&question)?;
        let image_name = normalize_image_name(&answer, &self.config.image_name);

        let document_path = self.config.output_dir.join(&self.config.document_name);
        let document_path = self.renderer.render(message.as_str(), &document_path)?;
        writeln!(self.output, "\n✓ HTML page created: {}", self.config.document_name)?;

        let uri = file_uri(&document_path);
        debug!(%uri, "encoding page link");
        self.encoder.encode(&uri, self.config.output_dir.join(&image_name))?;
        writeln!(self.output, "✓ QR code created: {image_name}")?;

        self.print_instructions()?;

        if self.confirm("\n\nDo you have a URL to create QR code? (y/n):")? {
            self.encode_hosted_url()?;
        }

        if self.confirm("\n\nCreate another QR code? (y/n):")? {
            Ok(Round::Again)
        } else {
            Ok(Round::Done)
        }
    }

    /// Second symbol for the page once it is hosted somewhere. An empty URL skips it.
    fn encode_hosted_url(&mut self) -> Result<()> {
        let url = self.ask("\nEnter the full URL (e.g., https://yoursite.com/message.html):")?;
        let url = url.trim();
        if url.is_empty() {
            debug!("no url given, skipping second symbol");
            return Ok(());
        }
        let url = url.to_string();

        let question = format!(
            "\nEnter QR code filename (press Enter for '{}'):",
            self.config.url_image_name
        );
        let answer = self.ask(&question)?;
        let image_name = normalize_image_name(&answer, &self.config.url_image_name);

        self.encoder.encode(&url, self.config.output_dir.join(&image_name))?;
        writeln!(self.output, "\n✓ QR code with URL created: {image_name}")?;
        writeln!(self.output, "✓ Scan this QR code with your phone to see the popup!")?;
        Ok(())
    }

    fn print_instructions(&mut self) -> Result<()> {
        let page = self.config.document_name.clone();
        writeln!(self.output)?;
        self.rule('=')?;
        writeln!(self.output, "SUCCESS! 🎉")?;
        self.rule('=')?;
        writeln!(self.output, "\n📱 INSTRUCTIONS:")?;
        self.rule('-')?;
        writeln!(self.output, "OPTION 1 - Local Testing (same device):")?;
        writeln!(self.output, "  1. Open '{page}' in your browser")?;
        writeln!(self.output, "  2. You'll see the popup effect")?;
        writeln!(self.output)?;
        writeln!(self.output, "OPTION 2 - For phone scanning (RECOMMENDED):")?;
        writeln!(self.output, "  You need to host the HTML file online.")?;
        writeln!(self.output, "  Free hosting options:")?;
        writeln!(self.output, "    • GitHub Pages (github.com)")?;
        writeln!(self.output, "    • Netlify Drop (app.netlify.com/drop)")?;
        writeln!(self.output, "    • Vercel (vercel.com)")?;
        writeln!(self.output)?;
        writeln!(self.output, "  Steps:")?;
        writeln!(self.output, "  1. Upload '{page}' to any free hosting")?;
        writeln!(self.output, "  2. Get the public URL (e.g., https://yoursite.netlify.app)")?;
        writeln!(self.output, "  3. Enter that URL below, or on your next run")?;
        self.rule('=')?;
        Ok(())
    }

    fn rule(&mut self, c: char) -> Result<()> {
        writeln!(self.output, "{}", c.to_string().repeat(RULE_WIDTH))?;
        Ok(())
    }

    /// Prints `question` and a `> ` marker, then reads one line without its line terminator.
    fn ask(&mut self, question: &str) -> Result<String> {
        writeln!(self.output, "{question}")?;
        write!(self.output, "> ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::InputClosed);
        }
        let len = line.trim_end_matches(|c: char| c == '\n' || c == '\r').len();
        line.truncate(len);
        Ok(line)
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(question)?;
        Ok(is_yes(&answer))
    }
}
