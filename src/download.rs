//! Download orchestration.
//!
//! Reads the head of the source to decide whether the file is already
//! fast-start. If it is, the bytes are copied as-is. Otherwise moov is
//! located at the tail, its chunk offsets are shifted by its own size, and
//! the output is written as ftyp, moov, then the media bytes that sat
//! between them. The output is written front to back without seeking.

use crate::config::DownloadConfig;
use crate::source::{read_exact_range, RangeSource};
use crate::{DownloadError, Result};
use faststart_media::mp4::BoxType;
use faststart_media::{fixup_moov_offsets, BoxHeader, FixupSummary, MoovMatch, TailScanner};
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};

/// Largest possible box header: 64-bit size plus uuid.
const MAX_HEADER_SIZE: u64 = 32;

/// Orchestrator state, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    CheckFastStart,
    DirectStream,
    LocateMoov,
    Relocate,
    WriteHeader,
    StreamContent,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::CheckFastStart => "check-fast-start",
            Self::DirectStream => "direct-stream",
            Self::LocateMoov => "locate-moov",
            Self::Relocate => "relocate",
            Self::WriteHeader => "write-header",
            Self::StreamContent => "stream-content",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Layout of the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// moov already follows ftyp; copied unmodified.
    FastStart,
    /// moov was moved from the tail to after ftyp.
    Relocated,
}

/// Cumulative transfer progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Media bytes copied so far.
    pub transferred: u64,
    /// Media bytes to copy in total.
    pub total: u64,
}

/// Outcome of a finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub layout: Layout,
    /// Length reported by the source.
    pub remote_size: u64,
    /// Bytes written to the output, headers included.
    pub bytes_written: u64,
    /// Size of the relocated moov box.
    pub moov_size: Option<u64>,
    /// Delta added to every chunk offset.
    pub delta: Option<u64>,
    pub fixup: Option<FixupSummary>,
}

/// Leading boxes of the source.
struct Head {
    ftyp: BoxHeader,
    ftyp_bytes: Vec<u8>,
    next: BoxHeader,
}

type ProgressFn = Box<dyn FnMut(Progress) + Send>;

/// One download session over a [`RangeSource`].
///
/// Holds everything that lives for one download: the source (and its cached
/// metadata), the configuration, the current stage and progress counters.
pub struct Downloader<S> {
    source: S,
    config: DownloadConfig,
    stage: Stage,
    progress: Option<ProgressFn>,
}

impl<S: RangeSource> Downloader<S> {
    pub fn new(source: S, config: DownloadConfig) -> Self {
        Self {
            source,
            config,
            stage: Stage::Init,
            progress: None,
        }
    }

    /// Call `f` with cumulative progress after every transferred chunk.
    pub fn on_progress(mut self, f: impl FnMut(Progress) + Send + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Download into a file, truncating it first.
    ///
    /// On error the file holds whatever was written before the failure.
    pub async fn download_to_path(&mut self, path: &Path) -> Result<DownloadReport> {
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await?;
        let mut writer = BufWriter::new(file);
        let report = self.download_to_writer(&mut writer).await?;
        writer.into_inner().sync_all().await?;
        Ok(report)
    }

    /// Download into any writer. The writer is flushed on success.
    pub async fn download_to_writer<W>(&mut self, out: &mut W) -> Result<DownloadReport>
    where
        W: AsyncWrite + Unpin + Send,
    {
        self.enter(Stage::Init);
        let remote_size = self.source.size().await?;
        let limit = remote_size.min(self.config.max_bytes);
        let head = self.read_head(remote_size).await?;

        self.enter(Stage::CheckFastStart);
        let report = if head.next.box_type == BoxType::MOOV {
            tracing::info!("'moov' box detected at start of file, starting direct download");
            self.enter(Stage::DirectStream);
            let written = self.stream_content(out, 0, limit).await?;
            DownloadReport {
                layout: Layout::FastStart,
                remote_size,
                bytes_written: written,
                moov_size: None,
                delta: None,
                fixup: None,
            }
        } else {
            tracing::info!(
                next = %head.next.box_type,
                "Trying to locate 'moov' box at end of file"
            );
            self.enter(Stage::LocateMoov);
            let moov = self.locate_moov(remote_size).await?;
            if moov.trailing != 0 {
                return Err(faststart_media::Error::malformed(format!(
                    "{} bytes follow the 'moov' box at the end of the file",
                    moov.trailing
                ))
                .into());
            }
            if moov.offset < head.ftyp.size {
                return Err(faststart_media::Error::malformed(
                    "'moov' box found at the tail overlaps 'ftyp'",
                )
                .into());
            }
            tracing::info!("'moov' box detected at {} bytes from EOF", moov.size);

            self.enter(Stage::Relocate);
            // ftyp keeps its place; only moov is inserted ahead of the media.
            let delta = moov.size;
            let mut moov_bytes = moov.bytes;
            let fixup = fixup_moov_offsets(&mut moov_bytes, delta)?;
            tracing::info!(
                tracks = fixup.tracks,
                tables = fixup.tables,
                entries = fixup.entries,
                delta,
                "Fixed offsets in 'moov' box"
            );

            self.enter(Stage::WriteHeader);
            out.write_all(&head.ftyp_bytes).await?;
            out.write_all(&moov_bytes).await?;
            let header_bytes = (head.ftyp_bytes.len() + moov_bytes.len()) as u64;

            let skip_at_end = moov.size + moov.trailing;
            let end = limit.saturating_sub(skip_at_end);
            let written = self.stream_content(out, head.ftyp.size, end).await?;

            DownloadReport {
                layout: Layout::Relocated,
                remote_size,
                bytes_written: header_bytes + written,
                moov_size: Some(moov.size),
                delta: Some(delta),
                fixup: Some(fixup),
            }
        };

        out.flush().await?;
        self.enter(Stage::Done);
        Ok(report)
    }

    fn enter(&mut self, stage: Stage) {
        tracing::debug!(from = %self.stage, to = %stage, "Download stage");
        self.stage = stage;
    }

    /// Read ftyp and the header of the box after it.
    async fn read_head(&mut self, remote_size: u64) -> Result<Head> {
        let probe_len = self.config.probe_size.min(remote_size);
        let probe = read_exact_range(&mut self.source, 0, probe_len).await?;

        let (ftyp, _) = BoxHeader::parse(&probe).map_err(|e| {
            faststart_media::Error::not_mp4(format!("MP4 file doesn't start with ftyp box: {}", e))
        })?;
        if ftyp.box_type != BoxType::FTYP {
            return Err(faststart_media::Error::not_mp4(format!(
                "MP4 file doesn't start with ftyp box, found '{}'",
                ftyp.box_type
            ))
            .into());
        }
        if ftyp.size >= remote_size {
            return Err(faststart_media::Error::not_mp4(format!(
                "nothing follows the {}-byte ftyp box in a {}-byte file",
                ftyp.size, remote_size
            ))
            .into());
        }
        if ftyp.size > self.config.moov_search_limit {
            return Err(faststart_media::Error::malformed(format!(
                "ftyp box of {} bytes is implausibly large",
                ftyp.size
            ))
            .into());
        }

        let ftyp_bytes = if ftyp.size <= probe.len() as u64 {
            probe[..ftyp.size as usize].to_vec()
        } else {
            read_exact_range(&mut self.source, 0, ftyp.size).await?
        };

        // Header of the next box, from the probe when it is fully inside it.
        let header_len = MAX_HEADER_SIZE.min(remote_size - ftyp.size);
        let next_bytes = if ftyp.size + header_len <= probe.len() as u64 {
            probe[ftyp.size as usize..(ftyp.size + header_len) as usize].to_vec()
        } else {
            read_exact_range(&mut self.source, ftyp.size, header_len).await?
        };
        let (next, _) = BoxHeader::parse(&next_bytes)?;

        Ok(Head {
            ftyp,
            ftyp_bytes,
            next,
        })
    }

    /// Drive the tail scan through the source.
    async fn locate_moov(&mut self, remote_size: u64) -> Result<MoovMatch> {
        let mut scanner = TailScanner::new(
            remote_size,
            self.config.moov_search_limit,
            self.config.moov_search_step,
        );
        while let Some(range) = scanner.next_request() {
            let part = read_exact_range(&mut self.source, range.start, range.len).await?;
            if let Some(found) = scanner.feed(&part)? {
                return Ok(found);
            }
        }
        Err(scanner.not_found().into())
    }

    /// Copy source bytes `[start, end)` to `out` through a fixed-size buffer.
    async fn stream_content<W>(&mut self, out: &mut W, start: u64, end: u64) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        self.enter(Stage::StreamContent);
        let total = end.saturating_sub(start);
        tracing::info!("Starting data transfer...");
        if total == 0 {
            return Ok(0);
        }

        let mut reader = self.source.read_range(start, total).await?;
        let mut buf = vec![0u8; self.config.transfer_buffer.min(total) as usize];
        let mut transferred = 0u64;

        while transferred < total {
            let want = (buf.len() as u64).min(total - transferred) as usize;
            let mut filled = 0;
            while filled < want {
                let n = reader.read(&mut buf[filled..want]).await?;
                if n == 0 {
                    return Err(DownloadError::range_mismatch(format!(
                        "unexpected end of data after {} of {} bytes",
                        transferred + filled as u64,
                        total
                    )));
                }
                filled += n;
            }
            out.write_all(&buf[..want]).await?;
            transferred += want as u64;

            tracing::info!("{}/{}", transferred, total);
            if let Some(progress) = self.progress.as_mut() {
                progress(Progress { transferred, total });
            }
        }

        tracing::info!("Data transfer complete");
        Ok(transferred)
    }
}
