//! Byte-level GIF block parsing for the info report.
//!
//! This walks the container structure only; pixel data is skipped, not
//! decompressed.

use std::path::Path;

use indexmap::IndexMap;

use crate::error::MetadataError;

/// Field name to `(value, description)` pairs of one header section.
pub type HeaderSection = IndexMap<String, (String, String)>;

/// Field name to value pairs describing one frame.
pub type FrameAttributes = IndexMap<String, String>;

/// Structured header and per-frame information of a GIF file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GifMetadata {
    /// Header sections in file order
    pub headers: IndexMap<String, HeaderSection>,
    /// One entry per image descriptor
    pub frames: Vec<FrameAttributes>,
}

/// Source of [`GifMetadata`] for a file on disk.
pub trait MetadataExtractor {
    fn extract(&self, path: &Path) -> Result<GifMetadata, MetadataError>;
}

/// The built-in GIF block parser.
#[derive(Clone, Copy, Debug, Default)]
pub struct GifParser;

impl MetadataExtractor for GifParser {
    fn extract(&self, path: &Path) -> Result<GifMetadata, MetadataError> {
        Self::parse_file(path)
    }
}

const HEADER_SIZE: usize = 13;

const EXTENSION: u8 = 0x21;
const IMAGE_DESCRIPTOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;

const GRAPHIC_CONTROL: u8 = 0xF9;
const APPLICATION: u8 = 0xFF;

impl GifParser {
    /// Read and parse a file.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<GifMetadata, MetadataError> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse_bytes(&data)
    }

    /// Parse GIF bytes.
    ///
    /// ## Format
    ///
    /// - Bytes 0-5: signature `GIF` and version (`87a` / `89a`)
    /// - Bytes 6-12: logical screen descriptor
    /// - Optional global color table
    /// - Blocks: extensions (`0x21`), image descriptors (`0x2C`), trailer (`0x3B`)
    ///
    /// ## Example
    ///
    /// ```rust
    /// use gif_view_core::GifParser;
    ///
    /// let bytes = [
    ///     b'G', b'I', b'F', b'8', b'9', b'a',
    ///     4, 0, 3, 0,  // 4x3
    ///     0, 0, 0,     // no global color table
    ///     0x3B,
    /// ];
    ///
    /// let meta = GifParser::parse_bytes(&bytes).unwrap();
    /// assert_eq!(meta.headers["Header"]["Version"].0, "89a");
    /// assert_eq!(meta.headers["Logical Screen Descriptor"]["Width"].0, "4");
    /// assert!(meta.frames.is_empty());
    /// ```
    pub fn parse_bytes(data: &[u8]) -> Result<GifMetadata, MetadataError> {
        if data.len() < HEADER_SIZE {
            return Err(MetadataError::TooShort {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }
        if &data[0..3] != b"GIF" {
            return Err(MetadataError::InvalidSignature(
                String::from_utf8_lossy(&data[0..6]).into_owned(),
            ));
        }

        let mut meta = GifMetadata::default();
        let mut r = Reader::new(data);

        r.skip(3)?;
        let version = String::from_utf8_lossy(r.take(3)?).into_owned();
        let mut header = HeaderSection::new();
        insert(&mut header, "Signature", "GIF", "File signature");
        insert(&mut header, "Version", version, "Format version");
        meta.headers.insert("Header".into(), header);

        let width = r.u16()?;
        let height = r.u16()?;
        let packed = r.u8()?;
        let background = r.u8()?;
        let aspect = r.u8()?;

        let has_gct = packed & 0x80 != 0;
        let gct_entries = 1usize << ((packed & 0x07) + 1);

        let mut screen = HeaderSection::new();
        insert(&mut screen, "Width", width, "Logical screen width in pixels");
        insert(&mut screen, "Height", height, "Logical screen height in pixels");
        insert(&mut screen, "Global Color Table Flag", has_gct as u8, "1 if a global color table follows");
        insert(&mut screen, "Color Resolution", ((packed >> 4) & 0x07) + 1, "Bits per primary color of the original");
        insert(&mut screen, "Sort Flag", (packed >> 3) & 0x01, "1 if the global color table is sorted by importance");
        insert(&mut screen, "Global Color Table Size", if has_gct { gct_entries } else { 0 }, "Number of global color table entries");
        insert(&mut screen, "Background Color Index", background, "Global color table index of the background");
        insert(&mut screen, "Pixel Aspect Ratio", aspect, "0 means no aspect ratio information");
        meta.headers.insert("Logical Screen Descriptor".into(), screen);

        if has_gct {
            r.skip(gct_entries * 3)?;
        }

        let mut control: Option<GraphicControl> = None;

        while let Some(introducer) = r.next_block() {
            match introducer {
                EXTENSION => {
                    let label = r.u8()?;
                    match label {
                        GRAPHIC_CONTROL => control = Some(GraphicControl::read(&mut r)?),
                        APPLICATION => {
                            if let Some(section) = read_application(&mut r)? {
                                meta.headers.insert("Application Extension".into(), section);
                            }
                        }
                        _ => r.skip_sub_blocks()?,
                    }
                }
                IMAGE_DESCRIPTOR => {
                    let frame = read_image(&mut r, control.take())?;
                    meta.frames.push(frame);
                }
                TRAILER => break,
                byte => {
                    return Err(MetadataError::UnknownBlock {
                        byte,
                        offset: r.pos - 1,
                    })
                }
            }
        }

        Ok(meta)
    }
}

fn insert(
    section: &mut HeaderSection,
    key: &str,
    value: impl ToString,
    description: &str,
) {
    section.insert(key.to_string(), (value.to_string(), description.to_string()));
}

/// Graphic control extension values that apply to the next image.
#[derive(Clone, Copy, Debug)]
struct GraphicControl {
    disposal: u8,
    delay_ms: u32,
    transparent: Option<u8>,
}

impl GraphicControl {
    fn read(r: &mut Reader<'_>) -> Result<Self, MetadataError> {
        let size = r.u8()? as usize;
        let block = r.take(size)?;
        r.skip_sub_blocks()?;
        if block.len() < 4 {
            return Ok(Self {
                disposal: 0,
                delay_ms: 0,
                transparent: None,
            });
        }
        let packed = block[0];
        let delay = u16::from_le_bytes([block[1], block[2]]);
        Ok(Self {
            disposal: (packed >> 2) & 0x07,
            delay_ms: delay as u32 * 10,
            transparent: (packed & 0x01 != 0).then_some(block[3]),
        })
    }
}

fn read_application(r: &mut Reader<'_>) -> Result<Option<HeaderSection>, MetadataError> {
    let size = r.u8()? as usize;
    let identifier = String::from_utf8_lossy(r.take(size)?).into_owned();

    let mut loop_count = None;
    loop {
        let len = r.u8()? as usize;
        if len == 0 {
            break;
        }
        let block = r.take(len)?;
        if (identifier == "NETSCAPE2.0" || identifier == "ANIMEXTS1.0")
            && block.len() >= 3
            && block[0] == 1
        {
            loop_count = Some(u16::from_le_bytes([block[1], block[2]]));
        }
    }

    let Some(count) = loop_count else {
        return Ok(None);
    };
    let mut section = HeaderSection::new();
    insert(&mut section, "Identifier", identifier, "Application identifier and auth code");
    insert(&mut section, "Loop Count", count, "0 means loop forever");
    Ok(Some(section))
}

fn read_image(
    r: &mut Reader<'_>,
    control: Option<GraphicControl>,
) -> Result<FrameAttributes, MetadataError> {
    let left = r.u16()?;
    let top = r.u16()?;
    let width = r.u16()?;
    let height = r.u16()?;
    let packed = r.u8()?;

    let has_lct = packed & 0x80 != 0;
    let interlaced = packed & 0x40 != 0;
    let lct_entries = 1usize << ((packed & 0x07) + 1);
    if has_lct {
        r.skip(lct_entries * 3)?;
    }

    // LZW minimum code size, then the compressed data
    r.u8()?;
    r.skip_sub_blocks()?;

    let mut attrs = FrameAttributes::new();
    attrs.insert("Left".into(), left.to_string());
    attrs.insert("Top".into(), top.to_string());
    attrs.insert("Width".into(), width.to_string());
    attrs.insert("Height".into(), height.to_string());
    attrs.insert(
        "Local Color Table".into(),
        if has_lct {
            format!("yes ({} entries)", lct_entries)
        } else {
            "no".into()
        },
    );
    attrs.insert("Interlaced".into(), yes_no(interlaced).into());

    match control {
        Some(gce) => {
            attrs.insert("Delay".into(), format!("{} ms", gce.delay_ms));
            attrs.insert("Disposal Method".into(), disposal_name(gce.disposal));
            attrs.insert(
                "Transparent Index".into(),
                gce.transparent.map_or_else(|| "none".into(), |i| i.to_string()),
            );
        }
        None => {
            attrs.insert("Delay".into(), "none".into());
            attrs.insert("Disposal Method".into(), disposal_name(0));
            attrs.insert("Transparent Index".into(), "none".into());
        }
    }
    Ok(attrs)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn disposal_name(method: u8) -> String {
    match method {
        0 => "unspecified".into(),
        1 => "do not dispose".into(),
        2 => "restore to background".into(),
        3 => "restore to previous".into(),
        n => format!("reserved ({})", n),
    }
}

/// Bounds-checked cursor over the file bytes.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn eof(&self) -> MetadataError {
        MetadataError::UnexpectedEof { offset: self.pos }
    }

    fn u8(&mut self) -> Result<u8, MetadataError> {
        let byte = *self.data.get(self.pos).ok_or_else(|| self.eof())?;
        self.pos += 1;
        Ok(byte)
    }

    fn u16(&mut self) -> Result<u16, MetadataError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], MetadataError> {
        let end = self.pos.checked_add(n).ok_or_else(|| self.eof())?;
        let slice = self.data.get(self.pos..end).ok_or_else(|| self.eof())?;
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> Result<(), MetadataError> {
        self.take(n).map(|_| ())
    }

    fn skip_sub_blocks(&mut self) -> Result<(), MetadataError> {
        loop {
            let len = self.u8()? as usize;
            if len == 0 {
                return Ok(());
            }
            self.skip(len)?;
        }
    }

    /// Next block introducer. A file that ends between blocks without a
    /// trailer is treated as complete.
    fn next_block(&mut self) -> Option<u8> {
        self.u8().ok()
    }
}
