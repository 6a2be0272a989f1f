use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::backend::project::timecode::format_timecode;
use crate::media::SourceMetadata;
use crate::schedule::ClipPlacement;

/// Version strings the editor writes into its own projects. Matching them
/// keeps the generated file byte-compatible with what the editor expects.
const SHOTCUT_TITLE: &str = "Shotcut version 24.04.01";
const MLT_VERSION: &str = "7.22.0";

/// One unique source file with its resolved technical metadata.
#[derive(Debug, Clone)]
pub struct SourceRef {
    pub path: PathBuf,
    pub meta: SourceMetadata,
}

impl SourceRef {
    fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Producer id in the reference bin
    fn bin_id(index: usize) -> String {
        format!("chain{}", index * 2)
    }

    /// Producer id on the playable track
    fn track_id(index: usize) -> String {
        format!("chain{}", index * 2 + 1)
    }
}

/// Render the whole MLT project document.
///
/// Producers are keyed by position in `sources` (full path identity), so
/// two files sharing a basename still get distinct ids; only the
/// `shotcut:hash` caption-level property is basename-derived.
pub fn render_document(placements: &[ClipPlacement], sources: &[SourceRef]) -> String {
    let profile =
        sources.first().map(|s| s.meta.clone()).unwrap_or_else(SourceMetadata::fallback);
    let (aspect_num, aspect_den) = reduced_aspect(profile.width, profile.height);

    let timeline_end =
        placements.iter().map(|p| p.timeline_end()).fold(0.0, f64::max);
    let black_out = format_timecode(timeline_end);

    let mut xml = Xml::new();
    xml.open(
        "mlt",
        &[
            ("LC_NUMERIC", "C".to_string()),
            ("version", MLT_VERSION.to_string()),
            ("title", SHOTCUT_TITLE.to_string()),
            ("producer", "main_bin".to_string()),
        ],
    );

    xml.empty(
        "profile",
        &[
            (
                "description",
                format!(
                    "{}x{} {}/{} fps",
                    profile.width, profile.height, profile.frame_rate_num, profile.frame_rate_den
                ),
            ),
            ("width", profile.width.to_string()),
            ("height", profile.height.to_string()),
            ("progressive", "1".to_string()),
            ("sample_aspect_num", "1".to_string()),
            ("sample_aspect_den", "1".to_string()),
            ("display_aspect_num", aspect_num.to_string()),
            ("display_aspect_den", aspect_den.to_string()),
            ("frame_rate_num", profile.frame_rate_num.to_string()),
            ("frame_rate_den", profile.frame_rate_den.to_string()),
            ("colorspace", "709".to_string()),
        ],
    );

    for (index, source) in sources.iter().enumerate() {
        write_bin_chain(&mut xml, index, source);
    }

    xml.open(
        "playlist",
        &[("id", "main_bin".to_string()), ("title", SHOTCUT_TITLE.to_string())],
    );
    xml.property("shotcut:projectAudioChannels", "2");
    xml.property("shotcut:projectFolder", "1");
    xml.property("xml_retain", "1");
    for (index, source) in sources.iter().enumerate() {
        xml.empty(
            "entry",
            &[
                ("producer", SourceRef::bin_id(index)),
                ("in", "00:00:00.000".to_string()),
                ("out", format_timecode(source.meta.duration)),
            ],
        );
    }
    xml.close("playlist");

    xml.open(
        "producer",
        &[
            ("id", "black".to_string()),
            ("in", "00:00:00.000".to_string()),
            ("out", black_out.clone()),
        ],
    );
    xml.property("length", &black_out);
    xml.property("eof", "pause");
    xml.property("resource", "0");
    xml.property("aspect_ratio", "1");
    xml.property("mlt_service", "color");
    xml.property("mlt_image_format", "rgba");
    xml.property("set.test_audio", "0");
    xml.close("producer");

    xml.open("playlist", &[("id", "background".to_string())]);
    xml.empty(
        "entry",
        &[
            ("producer", "black".to_string()),
            ("in", "00:00:00.000".to_string()),
            ("out", black_out.clone()),
        ],
    );
    xml.close("playlist");

    for (index, source) in sources.iter().enumerate() {
        write_track_chain(&mut xml, index, source);
    }

    xml.open("playlist", &[("id", "playlist0".to_string())]);
    xml.property("shotcut:video", "1");
    xml.property("shotcut:name", "V1");
    for placement in placements {
        if let Some(index) = sources.iter().position(|s| s.path == placement.source_path) {
            xml.empty(
                "entry",
                &[
                    ("producer", SourceRef::track_id(index)),
                    ("in", format_timecode(placement.source_offset)),
                    ("out", format_timecode(placement.source_end())),
                ],
            );
        }
    }
    xml.close("playlist");

    xml.open(
        "tractor",
        &[
            ("id", "tractor0".to_string()),
            ("title", SHOTCUT_TITLE.to_string()),
            ("in", "00:00:00.000".to_string()),
            ("out", black_out),
        ],
    );
    xml.property("shotcut", "1");
    xml.property("shotcut:projectAudioChannels", "2");
    xml.property("shotcut:projectFolder", "1");
    xml.empty("track", &[("producer", "background".to_string())]);
    xml.empty("track", &[("producer", "playlist0".to_string())]);

    xml.open("transition", &[("id", "transition0".to_string())]);
    xml.property("a_track", "0");
    xml.property("b_track", "1");
    xml.property("mlt_service", "mix");
    xml.property("always_active", "1");
    xml.property("sum", "1");
    xml.close("transition");

    xml.open("transition", &[("id", "transition1".to_string())]);
    xml.property("a_track", "0");
    xml.property("b_track", "1");
    xml.property("version", "0.1");
    xml.property("mlt_service", "frei0r.cairoblend");
    xml.property("threads", "0");
    xml.property("disable", "1");
    xml.close("transition");

    xml.close("tractor");
    xml.close("mlt");
    xml.finish()
}

/// Reference-bin producer with the full technical property enumeration.
fn write_bin_chain(xml: &mut Xml, index: usize, source: &SourceRef) {
    let meta = &source.meta;
    let duration_tc = format_timecode(meta.duration);

    xml.open(
        "chain",
        &[("id", SourceRef::bin_id(index)), ("out", duration_tc.clone())],
    );
    xml.property("length", &duration_tc);
    xml.property("eof", "pause");
    xml.property("resource", &source.path.display().to_string());
    xml.property("mlt_service", "avformat-novalidate");

    xml.property("meta.media.nb_streams", "5");
    xml.property("meta.media.0.stream.type", "video");
    xml.property("meta.media.0.stream.frame_rate", &meta.fps().to_string());
    xml.property("meta.media.0.stream.sample_aspect_ratio", "0");
    xml.property("meta.media.0.codec.width", &meta.width.to_string());
    xml.property("meta.media.0.codec.height", &meta.height.to_string());
    xml.property("meta.media.0.codec.pix_fmt", &meta.pix_fmt);
    xml.property("meta.media.0.codec.sample_aspect_ratio", "1");
    xml.property("meta.media.0.codec.colorspace", &meta.colorspace);
    xml.property("meta.media.0.codec.name", &meta.codec_name);

    xml.property("meta.media.1.stream.type", "audio");
    xml.property("meta.media.1.codec.sample_fmt", "fltp");
    xml.property("meta.media.1.codec.sample_rate", &meta.sample_rate.to_string());
    xml.property("meta.media.1.codec.channels", &meta.audio_channels.to_string());
    xml.property("meta.media.1.codec.name", &meta.audio_codec);

    xml.property("seekable", "1");
    xml.property("meta.media.sample_aspect_num", "1");
    xml.property("meta.media.sample_aspect_den", "1");
    xml.property("audio_index", "1");
    xml.property("video_index", "0");
    xml.property("creation_time", &meta.creation_time);
    xml.property("meta.media.frame_rate_num", &meta.frame_rate_num.to_string());
    xml.property("meta.media.frame_rate_den", &meta.frame_rate_den.to_string());
    xml.property("meta.media.colorspace", &meta.colorspace);
    xml.property("meta.media.width", &meta.width.to_string());
    xml.property("meta.media.height", &meta.height.to_string());

    xml.property("shotcut:hash", &resource_hash(&source.basename()));
    xml.property("xml", "was here");
    xml.close("chain");
}

/// Track producer: the abbreviated property set plus the caption shown in
/// the editor's timeline.
fn write_track_chain(xml: &mut Xml, index: usize, source: &SourceRef) {
    let meta = &source.meta;
    let duration_tc = format_timecode(meta.duration);

    xml.open(
        "chain",
        &[("id", SourceRef::track_id(index)), ("out", duration_tc.clone())],
    );
    xml.property("length", &duration_tc);
    xml.property("eof", "pause");
    xml.property("resource", &source.path.display().to_string());
    xml.property("mlt_service", "avformat-novalidate");

    xml.property("meta.media.nb_streams", "5");
    xml.property("meta.media.0.stream.type", "video");
    xml.property("meta.media.0.codec.width", &meta.width.to_string());
    xml.property("meta.media.0.codec.height", &meta.height.to_string());

    xml.property("seekable", "1");
    xml.property("audio_index", "1");
    xml.property("video_index", "0");
    xml.property("shotcut:hash", &resource_hash(&source.basename()));
    xml.property("xml", "was here");
    xml.property("shotcut:caption", &source.basename());
    xml.close("chain");
}

/// Stable content-derived resource identifier: 32 hex chars from the
/// basename, the width the editor expects for its hash property.
fn resource_hash(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    digest.iter().take(16).map(|b| format!("{b:02x}")).collect()
}

fn reduced_aspect(width: u32, height: u32) -> (u32, u32) {
    let mut a = width.max(1);
    let mut b = height.max(1);
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    (width.max(1) / a, height.max(1) / a)
}

/// Minimal indenting XML writer; just enough for the MLT schema.
struct Xml {
    buf: String,
    depth: usize,
}

impl Xml {
    fn new() -> Self {
        Self { buf: String::from("<?xml version=\"1.0\" standalone=\"no\"?>\n"), depth: 0 }
    }

    fn open(&mut self, tag: &str, attrs: &[(&str, String)]) {
        self.start_tag(tag, attrs);
        self.buf.push_str(">\n");
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth -= 1;
        self.indent();
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push_str(">\n");
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, String)]) {
        self.start_tag(tag, attrs);
        self.buf.push_str("/>\n");
    }

    fn property(&mut self, name: &str, value: &str) {
        self.indent();
        self.buf.push_str("<property name=\"");
        self.buf.push_str(&escape(name));
        self.buf.push_str("\">");
        self.buf.push_str(&escape(value));
        self.buf.push_str("</property>\n");
    }

    fn finish(self) -> String {
        self.buf
    }

    fn start_tag(&mut self, tag: &str, attrs: &[(&str, String)]) {
        self.indent();
        self.buf.push('<');
        self.buf.push_str(tag);
        for (key, value) in attrs {
            self.buf.push(' ');
            self.buf.push_str(key);
            self.buf.push_str("=\"");
            self.buf.push_str(&escape(value));
            self.buf.push('"');
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.buf.push_str("  ");
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
