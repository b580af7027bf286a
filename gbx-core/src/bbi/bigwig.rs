use std::collections::HashMap;
use std::io::{Cursor, Read};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;

use super::{
    BbiError, BbiHeader, BbiResult, ChromInfo, RangeReader, Summary, Value, ZoomHeader, ZoomRecord,
    BIGWIG_MAGIC, BIGWIG_MAGIC_SWAPPED, CHROM_TREE_HEADER_SIZE, CHROM_TREE_MAGIC,
    CIR_TREE_HEADER_SIZE, CIR_TREE_MAGIC, HEADER_SIZE, SECTION_HEADER_SIZE, SUMMARY_SIZE,
    ZOOM_HEADER_SIZE, ZOOM_RECORD_SIZE,
};

const SECTION_BEDGRAPH: u8 = 1;
const SECTION_VARIABLE_STEP: u8 = 2;
const SECTION_FIXED_STEP: u8 = 3;

/// Upper bound on buffers sized from counts read out of the file
const MAX_PREALLOC: usize = 1 << 16;

/// Cursor over a byte slice in the file's byte order
struct Decoder<'a> {
    cursor: Cursor<&'a [u8]>,
    big_endian: bool,
    what: &'static str,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8], big_endian: bool, what: &'static str) -> Self {
        Self {
            cursor: Cursor::new(data),
            big_endian,
            what,
        }
    }

    fn ensure(&self, n: u64) -> BbiResult<()> {
        let needed = self.cursor.position().saturating_add(n);
        let got = self.cursor.get_ref().len() as u64;
        if needed > got {
            return Err(BbiError::Truncated {
                what: self.what,
                needed,
                got,
            });
        }
        Ok(())
    }

    fn remaining(&self) -> u64 {
        (self.cursor.get_ref().len() as u64).saturating_sub(self.cursor.position())
    }

    fn skip(&mut self, n: u64) -> BbiResult<()> {
        self.ensure(n)?;
        self.cursor.set_position(self.cursor.position() + n);
        Ok(())
    }

    fn bytes(&mut self, n: usize) -> BbiResult<&'a [u8]> {
        self.ensure(n as u64)?;
        let start = self.cursor.position() as usize;
        let data: &'a [u8] = *self.cursor.get_ref();
        self.cursor.set_position((start + n) as u64);
        Ok(&data[start..start + n])
    }

    fn u8(&mut self) -> BbiResult<u8> {
        self.ensure(1)?;
        Ok(self.cursor.read_u8()?)
    }

    fn u16(&mut self) -> BbiResult<u16> {
        self.ensure(2)?;
        Ok(if self.big_endian {
            self.cursor.read_u16::<BigEndian>()?
        } else {
            self.cursor.read_u16::<LittleEndian>()?
        })
    }

    fn u32(&mut self) -> BbiResult<u32> {
        self.ensure(4)?;
        Ok(if self.big_endian {
            self.cursor.read_u32::<BigEndian>()?
        } else {
            self.cursor.read_u32::<LittleEndian>()?
        })
    }

    fn u64(&mut self) -> BbiResult<u64> {
        self.ensure(8)?;
        Ok(if self.big_endian {
            self.cursor.read_u64::<BigEndian>()?
        } else {
            self.cursor.read_u64::<LittleEndian>()?
        })
    }

    fn f32(&mut self) -> BbiResult<f32> {
        self.ensure(4)?;
        Ok(if self.big_endian {
            self.cursor.read_f32::<BigEndian>()?
        } else {
            self.cursor.read_f32::<LittleEndian>()?
        })
    }

    fn f64(&mut self) -> BbiResult<f64> {
        self.ensure(8)?;
        Ok(if self.big_endian {
            self.cursor.read_f64::<BigEndian>()?
        } else {
            self.cursor.read_f64::<LittleEndian>()?
        })
    }
}

/// Query `[qstart, qend)` on `qchrom` against an R-tree bounding box
fn overlaps(qchrom: u32, qstart: u32, qend: u32, start_chrom: u32, start_base: u32, end_chrom: u32, end_base: u32) -> bool {
    if qchrom < start_chrom || (qchrom == start_chrom && qend <= start_base) {
        return false;
    }
    if qchrom > end_chrom || (qchrom == end_chrom && qstart >= end_base) {
        return false;
    }
    true
}

fn clamp_u32(value: u64) -> u32 {
    value.min(u32::MAX as u64) as u32
}

/// An opened bigWig file
///
/// Opening reads the header, zoom headers, total summary and the whole
/// chromosome tree. Data blocks are read on demand.
#[derive(Debug)]
pub struct BigWigFile {
    reader: Box<dyn RangeReader>,
    header: BbiHeader,
    zoom_headers: Vec<ZoomHeader>,
    summary: Summary,
    chroms: Vec<ChromInfo>,
    chrom_index: HashMap<String, usize>,
}

impl BigWigFile {
    pub async fn open(reader: Box<dyn RangeReader>) -> BbiResult<Self> {
        let raw = fetch(reader.as_ref(), 0, HEADER_SIZE, "file header").await?;
        let header = parse_header(&raw)?;
        let be = header.big_endian;

        let mut zoom_headers = Vec::with_capacity(header.zoom_levels as usize);
        if header.zoom_levels > 0 {
            let len = header.zoom_levels as u64 * ZOOM_HEADER_SIZE;
            let raw = fetch(reader.as_ref(), HEADER_SIZE, len, "zoom headers").await?;
            let mut d = Decoder::new(&raw, be, "zoom headers");
            for _ in 0..header.zoom_levels {
                let reduction_level = d.u32()?;
                d.skip(4)?;
                zoom_headers.push(ZoomHeader {
                    reduction_level,
                    data_offset: d.u64()?,
                    index_offset: d.u64()?,
                });
            }
        }

        let summary = if header.total_summary_offset == 0 {
            Summary::default()
        } else {
            let raw = fetch(reader.as_ref(), header.total_summary_offset, SUMMARY_SIZE, "total summary").await?;
            let mut d = Decoder::new(&raw, be, "total summary");
            Summary {
                bases_covered: d.u64()?,
                min_val: d.f64()?,
                max_val: d.f64()?,
                sum: d.f64()?,
                sum_squares: d.f64()?,
            }
        };

        let mut chroms = read_chrom_tree(reader.as_ref(), header.chrom_tree_offset, be).await?;
        chroms.sort_by_key(|c| c.id);
        let chrom_index = chroms
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();

        log::debug!(
            "Opened bigWig {} (v{}, {} zoom levels, {} chromosomes{})",
            reader.location(),
            header.version,
            zoom_headers.len(),
            chroms.len(),
            if be { ", big-endian" } else { "" }
        );

        Ok(Self {
            reader,
            header,
            zoom_headers,
            summary,
            chroms,
            chrom_index,
        })
    }

    pub fn location(&self) -> &str {
        self.reader.location()
    }

    pub fn header(&self) -> &BbiHeader {
        &self.header
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Zoom levels in file order
    pub fn zoom_levels(&self) -> &[ZoomHeader] {
        &self.zoom_headers
    }

    /// Chromosomes ordered by id
    pub fn chromosomes(&self) -> &[ChromInfo] {
        &self.chroms
    }

    pub fn chromosome(&self, name: &str) -> Option<&ChromInfo> {
        self.chrom_index.get(name).map(|&i| &self.chroms[i])
    }

    /// Base-pair values overlapping `[start, end)` on `chr`.
    ///
    /// Chromosomes missing from the file yield no values.
    pub async fn read_raw(&self, chr: &str, start: u64, end: u64) -> BbiResult<Vec<Value>> {
        let Some(chrom) = self.chromosome(chr) else {
            log::debug!("{} has no chromosome {}", self.location(), chr);
            return Ok(Vec::new());
        };
        let (start, end) = (clamp_u32(start), clamp_u32(end));
        if start >= end {
            return Ok(Vec::new());
        }

        let blocks = self
            .find_blocks(self.header.full_index_offset, chrom.id, start, end)
            .await?;

        let mut values = Vec::new();
        for (offset, size) in blocks {
            let data = self.read_block(offset, size).await?;
            decode_section(&data, self.header.big_endian, chrom.id, start, end, &mut values)?;
        }
        Ok(values)
    }

    /// Summary records of zoom level `level` overlapping `[start, end)` on `chr`
    pub async fn read_zoom(&self, level: usize, chr: &str, start: u64, end: u64) -> BbiResult<Vec<ZoomRecord>> {
        let zoom = *self
            .zoom_headers
            .get(level)
            .ok_or(BbiError::NoSuchZoomLevel(level))?;
        let Some(chrom) = self.chromosome(chr) else {
            return Ok(Vec::new());
        };
        let (start, end) = (clamp_u32(start), clamp_u32(end));
        if start >= end {
            return Ok(Vec::new());
        }

        let blocks = self.find_blocks(zoom.index_offset, chrom.id, start, end).await?;

        let mut records = Vec::new();
        for (offset, size) in blocks {
            let data = self.read_block(offset, size).await?;
            let mut d = Decoder::new(&data, self.header.big_endian, "zoom block");
            while d.remaining() >= ZOOM_RECORD_SIZE as u64 {
                let chrom_id = d.u32()?;
                let record = ZoomRecord {
                    start: d.u32()?,
                    end: d.u32()?,
                    valid_count: d.u32()?,
                    min_val: d.f32()?,
                    max_val: d.f32()?,
                    sum: d.f32()?,
                    sum_squares: d.f32()?,
                };
                if chrom_id == chrom.id && record.start < end && record.end > start {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }

    /// Data blocks whose bounding boxes overlap the query, in file order
    async fn find_blocks(&self, index_offset: u64, chrom_id: u32, start: u32, end: u32) -> BbiResult<Vec<(u64, u64)>> {
        let be = self.header.big_endian;
        let raw = fetch(self.reader.as_ref(), index_offset, CIR_TREE_HEADER_SIZE, "index header").await?;
        let mut d = Decoder::new(&raw, be, "index header");
        let magic = d.u32()?;
        if magic != CIR_TREE_MAGIC {
            return Err(BbiError::InvalidMagic { what: "R-tree index", found: magic });
        }

        let mut blocks = Vec::new();
        let mut pending = vec![index_offset + CIR_TREE_HEADER_SIZE];

        while let Some(node_offset) = pending.pop() {
            let head = fetch(self.reader.as_ref(), node_offset, 4, "index node").await?;
            let mut d = Decoder::new(&head, be, "index node");
            let is_leaf = d.u8()? != 0;
            d.skip(1)?;
            let count = d.u16()? as u64;

            let item_size = if is_leaf { 32 } else { 24 };
            let items = fetch(self.reader.as_ref(), node_offset + 4, count * item_size, "index node").await?;
            let mut d = Decoder::new(&items, be, "index node");

            let mut children = Vec::new();
            for _ in 0..count {
                let start_chrom = d.u32()?;
                let start_base = d.u32()?;
                let end_chrom = d.u32()?;
                let end_base = d.u32()?;
                let hit = overlaps(chrom_id, start, end, start_chrom, start_base, end_chrom, end_base);
                if is_leaf {
                    let data_offset = d.u64()?;
                    let data_size = d.u64()?;
                    if hit {
                        blocks.push((data_offset, data_size));
                    }
                } else {
                    let child = d.u64()?;
                    if hit {
                        children.push(child);
                    }
                }
            }
            pending.extend(children.into_iter().rev());
        }

        blocks.sort_unstable();
        Ok(blocks)
    }

    async fn read_block(&self, offset: u64, size: u64) -> BbiResult<Vec<u8>> {
        let raw = fetch(self.reader.as_ref(), offset, size, "data block").await?;
        if !self.header.is_compressed() {
            return Ok(raw);
        }
        let mut out = Vec::with_capacity((self.header.uncompress_buf_size as usize).min(MAX_PREALLOC));
        ZlibDecoder::new(&raw[..])
            .read_to_end(&mut out)
            .map_err(|e| BbiError::Decompression(e.to_string()))?;
        Ok(out)
    }
}

async fn fetch(reader: &dyn RangeReader, offset: u64, len: u64, what: &'static str) -> BbiResult<Vec<u8>> {
    let data = reader.read_range(offset, len).await?;
    if (data.len() as u64) < len {
        return Err(BbiError::Truncated {
            what,
            needed: len,
            got: data.len() as u64,
        });
    }
    Ok(data)
}

fn parse_header(raw: &[u8]) -> BbiResult<BbiHeader> {
    let big_endian = match LittleEndian::read_u32(&raw[0..4]) {
        BIGWIG_MAGIC => false,
        BIGWIG_MAGIC_SWAPPED => true,
        found => return Err(BbiError::InvalidMagic { what: "file header", found }),
    };

    let mut d = Decoder::new(raw, big_endian, "file header");
    d.skip(4)?;
    Ok(BbiHeader {
        big_endian,
        version: d.u16()?,
        zoom_levels: d.u16()?,
        chrom_tree_offset: d.u64()?,
        full_data_offset: d.u64()?,
        full_index_offset: d.u64()?,
        field_count: d.u16()?,
        defined_field_count: d.u16()?,
        auto_sql_offset: d.u64()?,
        total_summary_offset: d.u64()?,
        uncompress_buf_size: d.u32()?,
        extension_offset: d.u64()?,
    })
}

async fn read_chrom_tree(reader: &dyn RangeReader, offset: u64, be: bool) -> BbiResult<Vec<ChromInfo>> {
    let raw = fetch(reader, offset, CHROM_TREE_HEADER_SIZE, "chromosome tree header").await?;
    let mut d = Decoder::new(&raw, be, "chromosome tree header");
    let magic = d.u32()?;
    if magic != CHROM_TREE_MAGIC {
        return Err(BbiError::InvalidMagic { what: "chromosome tree", found: magic });
    }
    let _block_size = d.u32()?;
    let key_size = d.u32()? as usize;
    let val_size = d.u32()? as u64;
    let item_count = d.u64()?;
    if val_size < 8 {
        return Err(BbiError::Corruption(format!(
            "chromosome tree value size {} is too small",
            val_size
        )));
    }

    let mut chroms = Vec::with_capacity(item_count.min(MAX_PREALLOC as u64) as usize);
    let mut pending = vec![offset + CHROM_TREE_HEADER_SIZE];

    while let Some(node_offset) = pending.pop() {
        let head = fetch(reader, node_offset, 4, "chromosome tree node").await?;
        let mut d = Decoder::new(&head, be, "chromosome tree node");
        let is_leaf = d.u8()? != 0;
        d.skip(1)?;
        let count = d.u16()? as u64;

        let item_size = key_size as u64 + if is_leaf { val_size } else { 8 };
        let items = fetch(reader, node_offset + 4, count * item_size, "chromosome tree node").await?;
        let mut d = Decoder::new(&items, be, "chromosome tree node");

        let mut children = Vec::new();
        for _ in 0..count {
            let key = d.bytes(key_size)?;
            if is_leaf {
                let name = String::from_utf8_lossy(key).trim_end_matches('\0').to_string();
                let id = d.u32()?;
                let length = d.u32()?;
                d.skip(val_size - 8)?;
                chroms.push(ChromInfo { name, id, length });
            } else {
                children.push(d.u64()?);
            }
        }
        pending.extend(children.into_iter().rev());
    }

    if chroms.len() as u64 != item_count {
        return Err(BbiError::Corruption(format!(
            "chromosome tree declares {} items but holds {}",
            item_count,
            chroms.len()
        )));
    }
    Ok(chroms)
}

/// Decode one wig section, keeping items on `chrom_id` that overlap the query
fn decode_section(data: &[u8], be: bool, chrom_id: u32, start: u32, end: u32, out: &mut Vec<Value>) -> BbiResult<()> {
    let mut d = Decoder::new(data, be, "wig section");
    d.ensure(SECTION_HEADER_SIZE as u64)?;
    let section_chrom = d.u32()?;
    let section_start = d.u32()?;
    let _section_end = d.u32()?;
    let item_step = d.u32()?;
    let item_span = d.u32()?;
    let kind = d.u8()?;
    d.skip(1)?;
    let item_count = d.u16()?;

    if section_chrom != chrom_id {
        return Ok(());
    }

    let mut push = |value: Value| {
        if value.start < end && value.end > start {
            out.push(value);
        }
    };

    match kind {
        SECTION_BEDGRAPH => {
            for _ in 0..item_count {
                push(Value {
                    start: d.u32()?,
                    end: d.u32()?,
                    value: d.f32()?,
                });
            }
        }
        SECTION_VARIABLE_STEP => {
            for _ in 0..item_count {
                let item_start = d.u32()?;
                push(Value {
                    start: item_start,
                    end: item_start.saturating_add(item_span),
                    value: d.f32()?,
                });
            }
        }
        SECTION_FIXED_STEP => {
            let mut item_start = section_start;
            for _ in 0..item_count {
                push(Value {
                    start: item_start,
                    end: item_start.saturating_add(item_span),
                    value: d.f32()?,
                });
                item_start = item_start.saturating_add(item_step);
            }
        }
        other => return Err(BbiError::UnknownSectionType(other)),
    }
    Ok(())
}
