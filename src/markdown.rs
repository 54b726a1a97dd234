//! Terminal rendering of reports
//!
//! A report is first turned into Markdown, then rendered with colors through
//! any `termcolor::WriteColor` sink.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::acquisition::{LinkStatus, StatusMap};
use crate::error::Result;
use crate::processor::Report;

/// Markdown document for a report and the status of every requested URL
pub fn report_markdown(report: &Report, statuses: &StatusMap) -> String {
    let mut markdown = format!("# {}\n\n{}\n", report.title.trim(), report.detailed_summary.trim());
    if !statuses.is_empty() {
        markdown.push('\n');
        markdown.push_str(&status_markdown(statuses));
    }
    markdown
}

/// Markdown section listing URL statuses
pub fn status_markdown(statuses: &StatusMap) -> String {
    let mut markdown = String::from("## Sources\n\n");
    for (url, status) in statuses {
        match status {
            LinkStatus::Accessed => markdown.push_str(&format!("- `{}`: accessed\n", url)),
            LinkStatus::Failed { reason, .. } => {
                let reason = reason.lines().next().unwrap_or_default();
                markdown.push_str(&format!("- `{}`: **failed** {}\n", url, reason));
            }
        }
    }
    markdown
}

/// Render markdown to stdout with colors when the terminal supports them
pub fn print_markdown(markdown: &str) -> Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    render_markdown(&mut stdout, markdown)
}

/// Render markdown into any color-capable writer
pub fn render_markdown<W: WriteColor>(out: &mut W, markdown: &str) -> Result<()> {
    let mut state = FormatState::default();
    for event in Parser::new_ext(markdown, Options::all()) {
        state.handle_event(out, event)?;
    }
    out.reset()?;
    Ok(())
}

/// Tracks the current formatting state
#[derive(Default)]
struct FormatState {
    list_level: usize,
    format_stack: Vec<ColorSpec>,
}

impl FormatState {
    fn handle_event<W: WriteColor>(&mut self, out: &mut W, event: Event) -> Result<()> {
        match event {
            Event::Start(tag) => self.handle_start(out, tag),
            Event::End(tag_end) => self.handle_end(out, tag_end),
            Event::Text(text) => Ok(write!(out, "{}", text)?),
            Event::Code(code) => self.write_inline_code(out, &code),
            Event::SoftBreak | Event::HardBreak => Ok(writeln!(out)?),
            _ => Ok(()),
        }
    }

    fn push(&mut self, out: &mut impl WriteColor, spec: ColorSpec) -> Result<()> {
        out.set_color(&spec)?;
        self.format_stack.push(spec);
        Ok(())
    }

    fn pop(&mut self, out: &mut impl WriteColor) -> Result<()> {
        self.format_stack.pop();
        match self.format_stack.last() {
            Some(spec) => out.set_color(spec)?,
            None => out.reset()?,
        }
        Ok(())
    }

    fn handle_start<W: WriteColor>(&mut self, out: &mut W, tag: Tag) -> Result<()> {
        match tag {
            Tag::Heading { level, .. } => {
                let color = match level {
                    HeadingLevel::H1 => Color::Rgb(255, 99, 71),
                    HeadingLevel::H2 => Color::Rgb(70, 130, 180),
                    _ => Color::Cyan,
                };
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(color)).set_bold(true);
                self.push(out, spec)?;
            }
            Tag::Strong => {
                let mut spec = ColorSpec::new();
                spec.set_bold(true).set_fg(Some(Color::Red));
                self.push(out, spec)?;
            }
            Tag::Emphasis => {
                let mut spec = ColorSpec::new();
                spec.set_italic(true);
                self.push(out, spec)?;
            }
            Tag::List(_) => self.list_level += 1,
            Tag::Item => write!(out, "{}• ", "  ".repeat(self.list_level.saturating_sub(1)))?,
            _ => {}
        }
        Ok(())
    }

    fn handle_end<W: WriteColor>(&mut self, out: &mut W, tag_end: TagEnd) -> Result<()> {
        match tag_end {
            TagEnd::Heading(_) => {
                self.pop(out)?;
                writeln!(out)?;
                writeln!(out)?;
            }
            TagEnd::Paragraph => {
                if self.list_level == 0 {
                    writeln!(out)?;
                    writeln!(out)?;
                }
            }
            TagEnd::Strong | TagEnd::Emphasis => self.pop(out)?,
            TagEnd::List(_) => self.list_level = self.list_level.saturating_sub(1),
            TagEnd::Item => writeln!(out)?,
            _ => {}
        }
        Ok(())
    }

    fn write_inline_code<W: WriteColor>(&self, out: &mut W, code: &str) -> Result<()> {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, "{}", code)?;
        match self.format_stack.last() {
            Some(spec) => out.set_color(spec)?,
            None => out.reset()?,
        }
        Ok(())
    }
}
