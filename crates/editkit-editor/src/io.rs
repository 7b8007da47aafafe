//! File load and save orchestration.
//!
//! Loading fills the buffer in blocks with progress callbacks and leaves no
//! partial state behind on failure. Saving streams the buffer through the
//! line-break translator, with quick, safe (write-then-rename) and backup
//! policies.

use std::fs;
use std::io::{BufWriter, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use editkit_buffer::{read_into, write_stream, LineBreaks, Offset, TEMP_BUF_LEN};
use editkit_settings::{EditOptions, SaveMode};

use crate::clipboard::COLUMN_BLOCK_MAGIC;
use crate::editor::{Editor, REDRAW_PAGE};
use crate::error::{EditorError, EditorResult};
use crate::undo::COLUMN_ON;

/// Progress callback invoked at block boundaries during a load. Receives
/// the number of bytes read so far; returning `false` aborts the load.
pub type ProgressFn<'a> = &'a mut dyn FnMut(u64) -> bool;

impl Editor {
    /// File this editor was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load `path` into a fresh editor.
    ///
    /// A missing file is created empty and deleted again if the buffer is
    /// never modified. Files above `filesize_threshold` are refused unless
    /// `force_large` is set. On any error the partially built editor is
    /// dropped.
    pub fn load_file(
        path: &Path,
        opts: &EditOptions,
        force_large: bool,
        progress: ProgressFn<'_>,
    ) -> EditorResult<Self> {
        let mut editor = Editor::new();
        editor.path = Some(path.to_path_buf());

        let file = match fs::File::open(path) {
            Ok(file) => Some(file),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                // create it, but remember to delete it if never modified
                fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(path)
                    .map_err(|source| EditorError::OpenFailed {
                        path: path.to_path_buf(),
                        source,
                    })?;
                editor.delete_file = true;
                None
            }
            Err(source) => {
                return Err(EditorError::OpenFailed {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let meta = fs::metadata(path).map_err(|source| EditorError::StatFailed {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.is_file() {
            return Err(EditorError::NotRegularFile {
                path: path.to_path_buf(),
            });
        }
        let size = meta.len();
        if size > 0 {
            editor.delete_file = false;
        }
        if size > opts.filesize_threshold && !force_large {
            return Err(EditorError::OverThreshold {
                path: path.to_path_buf(),
                size,
                threshold: opts.filesize_threshold,
            });
        }

        if let Some(mut file) = file {
            let loaded = match read_into(&mut editor.buffer, &mut file, size, progress) {
                Ok(loaded) => loaded,
                Err(editkit_buffer::BufferError::Aborted { loaded }) => {
                    return Err(EditorError::Aborted { loaded })
                }
                Err(err) => return Err(err.into()),
            };
            if loaded != size {
                return Err(EditorError::ShortRead {
                    expected: size,
                    loaded,
                });
            }
        }

        editor.line_breaks = LineBreaks::Asis;
        editor.loading_done = true;
        editor.modified = false;
        tracing::debug!(
            path = %path.display(),
            bytes = editor.buffer.size(),
            lines = editor.buffer.lines(),
            "file loaded"
        );
        Ok(editor)
    }

    /// Save the buffer to `path` (or the load path), applying the
    /// line-break mode and the configured save policy.
    pub fn save_file(&mut self, path: Option<&Path>, opts: &EditOptions) -> EditorResult<()> {
        let target: PathBuf = match path.or(self.path.as_deref()) {
            Some(p) => p.to_path_buf(),
            None => {
                return Err(EditorError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "no file name",
                )))
            }
        };

        if opts.check_nl_at_eof
            && self.buffer.size() > 0
            && self.buffer.byte_at(self.buffer.size() - 1) != b'\n'
        {
            return Err(EditorError::NoTrailingNewline);
        }

        match opts.save_mode {
            SaveMode::Quick => self.write_to_path(&target)?,
            SaveMode::Safe => {
                let mut tmp = target.clone().into_os_string();
                tmp.push(".tmp~");
                let tmp = PathBuf::from(tmp);
                self.write_to_path(&tmp)?;
                fs::rename(&tmp, &target)?;
            }
            SaveMode::DoBackups => {
                if target.exists() {
                    let mut backup = target.clone().into_os_string();
                    backup.push(&opts.backup_ext);
                    fs::copy(&target, PathBuf::from(backup))?;
                }
                self.write_to_path(&target)?;
            }
        }

        self.modified = false;
        self.delete_file = false;
        if self.locked {
            if let Some(p) = self.path.clone() {
                self.locked = self.lock.unlock(&p);
            }
        }
        tracing::debug!(path = %target.display(), bytes = self.buffer.size(), "file saved");
        Ok(())
    }

    fn write_to_path(&self, target: &Path) -> EditorResult<()> {
        let file = fs::File::create(target)?;
        let mut writer = BufWriter::new(file);
        match write_stream(&self.buffer, &mut writer, self.line_breaks) {
            Ok(_) => {}
            Err(editkit_buffer::BufferError::Write { offset, source }) => {
                return Err(EditorError::SaveFailed {
                    offset,
                    size: self.buffer.size(),
                    source,
                });
            }
            Err(err) => return Err(err.into()),
        }
        use std::io::Write as _;
        writer.flush()?;
        Ok(())
    }

    /// Insert the contents of `path` at the cursor; returns the inserted
    /// byte count.
    ///
    /// A payload starting with the column-block magic inserts as a
    /// rectangle and selects it. Otherwise the bytes insert as a stream,
    /// the cursor staying at the block start unless
    /// `cursor_after_inserted_block` is set.
    pub fn insert_file(&mut self, path: &Path, opts: &EditOptions) -> EditorResult<Offset> {
        let mut file = fs::File::open(path).map_err(|source| EditorError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let current = self.buffer.curs1();
        let ins_len: Offset;

        let mut magic = [0u8; COLUMN_BLOCK_MAGIC.len()];
        let n = file.read(&mut magic)?;
        let vertical = n == magic.len() && magic == COLUMN_BLOCK_MAGIC;
        if !vertical {
            file.seek(SeekFrom::Start(0))?;
        }

        if vertical {
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            let (_, m2, c1, c2) = self.insert_column(opts, &data);
            ins_len = m2 - current;
            let curs = self.buffer.curs1();
            self.set_markers(curs, m2, c1, c2);

            // highlight inserted text when blocks are not persistent
            if !opts.persistent_selections && self.modified {
                if !self.column_highlight {
                    self.push_undo_action(crate::undo::COLUMN_OFF);
                }
                self.column_highlight = true;
            }
        } else {
            let mut block = [0u8; TEMP_BUF_LEN];
            loop {
                let n = file.read(&mut block)?;
                if n == 0 {
                    break;
                }
                for &b in &block[..n] {
                    self.insert(b);
                }
            }
            ins_len = self.buffer.curs1() - current;

            if !opts.persistent_selections && self.modified {
                let curs = self.buffer.curs1();
                self.set_markers(curs, current, 0, 0);
                if self.column_highlight {
                    self.push_undo_action(COLUMN_ON);
                }
                self.column_highlight = false;
            }

            // place the cursor back unless it belongs after the block
            if !opts.cursor_after_inserted_block {
                self.cursor_move(-(ins_len));
            }
        }

        self.force |= REDRAW_PAGE;
        Ok(ins_len)
    }

    /// Insert every byte of `reader` at the cursor, one at a time. Used
    /// for sources whose size is unknown; the undo log is disabled while
    /// it runs.
    pub fn insert_stream<R: Read>(&mut self, reader: &mut R) -> EditorResult<Offset> {
        self.undo_disabled = true;
        let mut count: Offset = 0;
        let mut byte = [0u8; 1];
        loop {
            match reader.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    self.insert(byte[0]);
                    count += 1;
                }
                Err(err) => {
                    self.undo_disabled = false;
                    return Err(err.into());
                }
            }
        }
        self.undo_disabled = false;
        self.redo.reset();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> EditOptions {
        EditOptions::default()
    }

    #[test]
    fn test_load_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        fs::write(&path, b"alpha\nbeta\ngamma\n").unwrap();

        let mut editor = Editor::load_file(&path, &opts(), false, &mut |_| true).unwrap();
        assert_eq!(editor.text(), b"alpha\nbeta\ngamma\n");
        assert_eq!(editor.buffer().lines(), 3);
        assert!(!editor.is_modified());

        editor.cursor_move(5);
        editor.insert(b'!');
        assert!(editor.is_modified());
        editor.save_file(None, &opts()).unwrap();
        assert!(!editor.is_modified());
        assert_eq!(fs::read(&path).unwrap(), b"alpha!\nbeta\ngamma\n");
    }

    #[test]
    fn test_load_missing_file_creates_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.txt");
        let editor = Editor::load_file(&path, &opts(), false, &mut |_| true).unwrap();
        assert!(editor.buffer().is_empty());
        assert!(path.exists());
        assert!(editor.delete_file);
    }

    #[test]
    fn test_load_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = Editor::load_file(dir.path(), &opts(), false, &mut |_| true);
        assert!(matches!(result, Err(EditorError::NotRegularFile { .. })));
    }

    #[test]
    fn test_load_over_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        fs::write(&path, vec![b'x'; 4096]).unwrap();

        let small = EditOptions {
            filesize_threshold: 1024,
            ..Default::default()
        };
        let result = Editor::load_file(&path, &small, false, &mut |_| true);
        assert!(matches!(result, Err(EditorError::OverThreshold { .. })));

        // the caller may override
        let editor = Editor::load_file(&path, &small, true, &mut |_| true).unwrap();
        assert_eq!(editor.buffer().size(), 4096);
    }

    #[test]
    fn test_load_abort() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        fs::write(&path, vec![b'y'; 8192]).unwrap();

        let result = Editor::load_file(&path, &opts(), false, &mut |loaded| loaded < 2048);
        assert!(matches!(result, Err(EditorError::Aborted { .. })));
    }

    #[test]
    fn test_save_line_breaks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lb.txt");

        let mut editor = Editor::from_bytes(b"a\r\nb\rc\n");
        editor.set_line_breaks(LineBreaks::Unix);
        editor.save_file(Some(&path), &opts()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"a\nb\nc\n");

        editor.set_line_breaks(LineBreaks::Win);
        editor.save_file(Some(&path), &opts()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"a\r\nb\r\nc\r\n");

        editor.set_line_breaks(LineBreaks::Mac);
        editor.save_file(Some(&path), &opts()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"a\rb\rc\r");
    }

    #[test]
    fn test_save_checks_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nl.txt");
        let check = EditOptions {
            check_nl_at_eof: true,
            ..Default::default()
        };

        let mut editor = Editor::from_bytes(b"abc");
        let result = editor.save_file(Some(&path), &check);
        assert!(matches!(result, Err(EditorError::NoTrailingNewline)));

        editor.ensure_trailing_newline();
        editor.save_file(Some(&path), &check).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"abc\n");
    }

    #[test]
    fn test_save_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        fs::write(&path, b"old contents").unwrap();

        let backup_opts = EditOptions {
            save_mode: SaveMode::DoBackups,
            ..Default::default()
        };
        let mut editor = Editor::from_bytes(b"new contents");
        editor.save_file(Some(&path), &backup_opts).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new contents");
        assert_eq!(
            fs::read(dir.path().join("data.txt~")).unwrap(),
            b"old contents"
        );
    }

    #[test]
    fn test_save_safe_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("safe.txt");
        let safe = EditOptions {
            save_mode: SaveMode::Safe,
            ..Default::default()
        };
        let mut editor = Editor::from_bytes(b"payload");
        editor.save_file(Some(&path), &safe).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"payload");
        assert!(!dir.path().join("safe.txt.tmp~").exists());
    }

    #[test]
    fn test_insert_file_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ins.txt");
        fs::write(&path, b"XYZ").unwrap();

        let mut editor = Editor::from_bytes(b"ab");
        editor.cursor_move(1);
        let n = editor.insert_file(&path, &opts()).unwrap();
        assert_eq!(n, 3);
        assert_eq!(editor.text(), b"aXYZb");
        // cursor back at the insertion point by default
        assert_eq!(editor.cursor_offset(), 1);
    }

    #[test]
    fn test_insert_file_column_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("col.txt");
        let mut payload = COLUMN_BLOCK_MAGIC.to_vec();
        payload.extend_from_slice(b"X\nY\nZ");
        fs::write(&path, payload).unwrap();

        let mut editor = Editor::from_bytes(b"aaa\nbbb\nccc\n");
        editor.cursor_move(1);
        editor.insert_file(&path, &opts()).unwrap();
        assert_eq!(editor.text(), b"aXaa\nbYbb\ncZcc\n");
    }

    #[test]
    fn test_insert_stream_disables_undo() {
        let mut editor = Editor::from_bytes(b"");
        let mut src = std::io::Cursor::new(b"streamed".to_vec());
        let n = editor.insert_stream(&mut src).unwrap();
        assert_eq!(n, 8);
        assert_eq!(editor.text(), b"streamed");
        assert!(editor.undo.is_empty());
    }
}
