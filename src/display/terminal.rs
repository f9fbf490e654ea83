//! Terminal display
//!
//! Renders every stream window into the alternate screen using truecolor
//! half-block cells: each character cell shows two vertically stacked pixels
//! (`▀` with the upper pixel as foreground and the lower as background).
//!
//! The pixel layout of all windows is mapped uniformly onto the terminal,
//! keeping the grid arrangement. Each window gets a title row with its label;
//! the last terminal row is a status line for operator notices.
//!
//! Keys are read by a blocking worker that posts [`Command`]s into a channel
//! drained by the player once per tick.

use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::{cursor, queue, terminal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::layout::{bounding_size, WindowRect};
use super::DisplaySink;
use crate::error::{Error, Result};
use crate::media::{Frame, StreamLabel};
use crate::playback::Command;

/// How often the key reader checks whether it should stop
const KEY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Upper half block
const HALF_BLOCK: char = '▀';

/// Set while a display holds raw mode and the alternate screen
static SCREEN_OWNED: AtomicBool = AtomicBool::new(false);

/// Whether a terminal display currently owns the screen
///
/// Anything writing to the terminal, loggers on stderr included, must stay
/// quiet while this holds or its output lands inside the rendered grid.
pub fn screen_owned() -> bool {
    SCREEN_OWNED.load(Ordering::Acquire)
}

/// Window position in terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRect {
    col: u16,
    row: u16,
    cols: u16,
    rows: u16,
}

/// Display sink drawing into a terminal
pub struct TerminalDisplay<W: Write = Stdout> {
    out: W,
    windows: Vec<(StreamLabel, WindowRect)>,
    /// Cell regions, recomputed when windows change
    cells: Vec<CellRect>,
    /// Terminal size in cells (columns, rows)
    size: (u16, u16),
    /// Raw mode and alternate screen are active and must be restored
    owns_terminal: bool,
    destroyed: bool,
}

impl TerminalDisplay<Stdout> {
    /// Take over the terminal: raw mode, alternate screen, hidden cursor
    ///
    /// The terminal is restored by [`destroy_all_windows`](DisplaySink::destroy_all_windows)
    /// or, failing that, on drop.
    pub fn enter() -> Result<Self> {
        let size = terminal::size().map_err(sink_error)?;
        terminal::enable_raw_mode().map_err(sink_error)?;
        SCREEN_OWNED.store(true, Ordering::Release);

        let mut display = Self {
            out: io::stdout(),
            windows: Vec::new(),
            cells: Vec::new(),
            size,
            owns_terminal: true,
            destroyed: false,
        };

        crossterm::execute!(
            display.out,
            terminal::EnterAlternateScreen,
            terminal::Clear(terminal::ClearType::All),
            cursor::Hide,
            cursor::MoveTo(0, 0)
        )
        .map_err(sink_error)?;
        tracing::debug!(cols = size.0, rows = size.1, "Terminal display entered");

        Ok(display)
    }
}

impl<W: Write> TerminalDisplay<W> {
    /// Draw into an arbitrary writer of the given size, leaving terminal modes alone
    pub fn with_writer(out: W, cols: u16, rows: u16) -> Self {
        Self {
            out,
            windows: Vec::new(),
            cells: Vec::new(),
            size: (cols.max(1), rows.max(2)),
            owns_terminal: false,
            destroyed: false,
        }
    }

    /// Get a reference to the underlying writer
    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Map every window's pixel rectangle onto terminal cells
    fn relayout(&mut self) {
        let (cols, rows) = self.size;
        let usable_rows = u32::from(rows.saturating_sub(1)).max(1);

        let rects: Vec<WindowRect> = self.windows.iter().map(|(_, r)| *r).collect();
        let min_x = rects.iter().map(|r| r.x).min().unwrap_or(0);
        let min_y = rects.iter().map(|r| r.y).min().unwrap_or(0);
        let (max_x, max_y) = bounding_size(&rects);

        // Pixels per cell column; a cell row spans twice as many pixels
        let scale = (max_x - min_x)
            .div_ceil(u32::from(cols))
            .max((max_y - min_y).div_ceil(2 * usable_rows))
            .max(1);

        self.cells = self
            .windows
            .iter()
            .map(|(_, r)| CellRect {
                col: ((r.x - min_x) / scale) as u16,
                row: ((r.y - min_y) / (2 * scale)) as u16,
                cols: (r.width / scale).max(1) as u16,
                rows: (r.height / (2 * scale)).max(1) as u16,
            })
            .collect();
    }

    fn draw_frame(&mut self, region: CellRect, label: &StreamLabel, frame: &Frame) -> io::Result<()> {
        let (term_cols, term_rows) = self.size;
        let last_row = term_rows.saturating_sub(1);
        let width = region.cols.min(term_cols.saturating_sub(region.col));
        if width == 0 || region.row >= last_row {
            return Ok(());
        }

        let title: String = label.as_str().chars().take(width as usize).collect();
        queue!(
            self.out,
            cursor::MoveTo(region.col, region.row),
            ResetColor,
            Print(format!("{:<w$}", title, w = width as usize))
        )?;

        let image_rows = region.rows.saturating_sub(1).max(1);
        let pixel_rows = 2 * u32::from(image_rows);
        for r in 0..image_rows {
            let row = region.row + 1 + r;
            if row >= last_row {
                break;
            }
            queue!(self.out, cursor::MoveTo(region.col, row))?;
            let top_y = (2 * u32::from(r)) * frame.height / pixel_rows;
            let bottom_y = (2 * u32::from(r) + 1) * frame.height / pixel_rows;
            for c in 0..width {
                let x = u32::from(c) * frame.width / u32::from(region.cols);
                let (tr, tg, tb) = frame.rgb_at(x, top_y);
                let (br, bg, bb) = frame.rgb_at(x, bottom_y);
                queue!(
                    self.out,
                    SetForegroundColor(Color::Rgb { r: tr, g: tg, b: tb }),
                    SetBackgroundColor(Color::Rgb { r: br, g: bg, b: bb }),
                    Print(HALF_BLOCK)
                )?;
            }
        }
        queue!(self.out, ResetColor)
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.owns_terminal {
            self.owns_terminal = false;
            let left = crossterm::execute!(
                self.out,
                ResetColor,
                cursor::Show,
                terminal::LeaveAlternateScreen
            );
            let raw = terminal::disable_raw_mode();
            SCREEN_OWNED.store(false, Ordering::Release);
            left.and(raw)?;
        }
        Ok(())
    }
}

impl<W: Write> DisplaySink for TerminalDisplay<W> {
    fn create_window(&mut self, label: &StreamLabel, rect: WindowRect) -> Result<()> {
        self.windows.push((label.clone(), rect));
        self.relayout();
        tracing::debug!(stream = %label, x = rect.x, y = rect.y, "Window created");
        Ok(())
    }

    fn show(&mut self, label: &StreamLabel, frame: &Frame) -> Result<()> {
        if frame.width == 0 || frame.height == 0 {
            return Ok(());
        }
        let Some(index) = self.windows.iter().position(|(l, _)| l == label) else {
            tracing::trace!(stream = %label, "No window for stream");
            return Ok(());
        };
        let region = self.cells[index];
        self.draw_frame(region, label, frame).map_err(sink_error)
    }

    fn present(&mut self) -> Result<()> {
        self.out.flush().map_err(sink_error)
    }

    fn status(&mut self, line: &str) -> Result<()> {
        let (cols, rows) = self.size;
        // Multi-line messages (help) show their first line only
        let first = line.lines().next().unwrap_or("");
        let text: String = first.chars().take(cols as usize).collect();
        queue!(
            self.out,
            cursor::MoveTo(0, rows.saturating_sub(1)),
            ResetColor,
            terminal::Clear(terminal::ClearType::CurrentLine),
            Print(text)
        )
        .and_then(|()| self.out.flush())
        .map_err(sink_error)
    }

    fn destroy_all_windows(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;
        self.windows.clear();
        self.cells.clear();
        self.restore().map_err(sink_error)?;
        tracing::debug!("Windows destroyed");
        Ok(())
    }
}

impl<W: Write> Drop for TerminalDisplay<W> {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

fn sink_error(e: io::Error) -> Error {
    Error::Display(e.to_string())
}

/// Map a key event to a command
///
/// `Esc` and `Ctrl-C` quit as well, since raw mode swallows the interrupt.
pub fn command_for_key(key: &KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
        KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => None,
        KeyCode::Char(c) => Command::from_key(c),
        _ => None,
    }
}

/// Handle to the background key reader
pub struct KeyReader {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl KeyReader {
    /// Ask the reader to stop and wait for it
    pub async fn shutdown(self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Key reader task failed");
        }
    }
}

/// Spawn a blocking worker forwarding key presses as commands
///
/// The worker exits when the receiver is dropped, when stopped through the
/// returned handle, or when reading the terminal fails.
pub fn spawn_key_reader(tx: mpsc::Sender<Command>) -> KeyReader {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);

    let handle = tokio::task::spawn_blocking(move || {
        while !stop_flag.load(Ordering::Relaxed) && !tx.is_closed() {
            match event::poll(KEY_POLL_INTERVAL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to poll terminal");
                    break;
                }
            }
            match event::read() {
                Ok(Event::Key(key)) => {
                    if let Some(command) = command_for_key(&key) {
                        tracing::trace!(?command, "Key command");
                        if tx.blocking_send(command).is_err() {
                            break;
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read terminal event");
                    break;
                }
            }
        }
    });

    KeyReader { stop, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::layout::{window_placement, Point};
    use crate::media::process::solid_rgb;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_command_for_key() {
        assert_eq!(
            command_for_key(&key(KeyCode::Char('b'), KeyModifiers::NONE)),
            Some(Command::Freeze)
        );
        assert_eq!(
            command_for_key(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Quit)
        );
        assert_eq!(
            command_for_key(&key(KeyCode::Char('b'), KeyModifiers::CONTROL)),
            None
        );
        assert_eq!(command_for_key(&key(KeyCode::Esc, KeyModifiers::NONE)), Some(Command::Quit));
        assert_eq!(command_for_key(&key(KeyCode::Char('z'), KeyModifiers::NONE)), None);
        assert_eq!(command_for_key(&key(KeyCode::Up, KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_relayout_fits_terminal() {
        let mut display = TerminalDisplay::with_writer(Vec::new(), 80, 25);
        let rects = window_placement(4, 704, 480, 2, Point::new(0, 100));
        for (i, rect) in rects.into_iter().enumerate() {
            display
                .create_window(&StreamLabel::new(format!("s{}", i)), rect)
                .unwrap();
        }

        // 1408px over 80 columns and 960px over 48 pixel rows: 20px per cell
        assert_eq!(display.cells[0], CellRect { col: 0, row: 0, cols: 35, rows: 12 });
        assert_eq!(display.cells[3], CellRect { col: 35, row: 12, cols: 35, rows: 12 });
        for cell in &display.cells {
            assert!(cell.col + cell.cols <= 80);
            assert!(cell.row + cell.rows <= 24);
        }
    }

    #[test]
    fn test_show_draws_title_and_pixels() {
        let mut display = TerminalDisplay::with_writer(Vec::new(), 20, 10);
        let label = StreamLabel::new("clip.y4m");
        display
            .create_window(&label, WindowRect { x: 0, y: 0, width: 8, height: 8 })
            .unwrap();

        display.show(&label, &solid_rgb(4, 4, (255, 0, 0))).unwrap();
        display.present().unwrap();

        let output = String::from_utf8_lossy(display.writer()).into_owned();
        assert!(output.contains("clip.y4m"));
        assert!(output.contains(HALF_BLOCK));
    }

    #[test]
    fn test_show_unknown_label_is_ignored() {
        let mut display = TerminalDisplay::with_writer(Vec::new(), 20, 10);
        display
            .show(&StreamLabel::new("nope"), &solid_rgb(2, 2, (0, 0, 0)))
            .unwrap();
        assert!(display.writer().is_empty());
    }

    #[test]
    fn test_status_line() {
        let mut display = TerminalDisplay::with_writer(Vec::new(), 12, 5);
        display.status("Cannot rewind anymore").unwrap();

        let output = String::from_utf8_lossy(display.writer()).into_owned();
        assert!(output.contains("Cannot rewin"));
        assert!(!output.contains("anymore"));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut display = TerminalDisplay::with_writer(Vec::new(), 20, 10);
        display
            .create_window(&StreamLabel::new("a"), WindowRect { x: 0, y: 0, width: 4, height: 4 })
            .unwrap();

        display.destroy_all_windows().unwrap();
        display.destroy_all_windows().unwrap();
        assert!(display.windows.is_empty());
    }

    #[derive(Clone, Default)]
    struct SharedLog(Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for SharedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_terminal_log_writer_muted_while_screen_owned() {
        use tracing_subscriber::fmt::writer::MakeWriterExt;

        let log = SharedLog::default();
        let sink = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer((move || sink.clone()).with_filter(|_| !screen_owned()))
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("before entering");
            SCREEN_OWNED.store(true, Ordering::Release);
            tracing::warn!("while drawing");
            SCREEN_OWNED.store(false, Ordering::Release);
            tracing::warn!("after leaving");
        });

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("before entering"));
        assert!(output.contains("after leaving"));
        assert!(!output.contains("while drawing"));
    }

    #[test]
    fn test_writer_display_never_claims_screen() {
        let mut display = TerminalDisplay::with_writer(Vec::new(), 20, 10);
        display.destroy_all_windows().unwrap();
        assert!(!display.owns_terminal);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn test_write_failure_is_display_error() {
        let mut display = TerminalDisplay::with_writer(BrokenPipe, 20, 10);
        assert!(matches!(display.status("hello"), Err(Error::Display(_))));
        assert!(matches!(display.present(), Err(Error::Display(_))));
    }
}
