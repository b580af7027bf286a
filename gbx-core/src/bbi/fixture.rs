//! In-memory bigWig files for tests

use std::io::Write;
use std::marker::PhantomData;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::{BIGWIG_MAGIC, CHROM_TREE_MAGIC, CIR_TREE_MAGIC};

/// One wig section, stored as its own data block
#[derive(Debug, Clone)]
pub(crate) enum Section {
    BedGraph {
        chrom_id: u32,
        items: Vec<(u32, u32, f32)>,
    },
    VariableStep {
        chrom_id: u32,
        span: u32,
        items: Vec<(u32, f32)>,
    },
    FixedStep {
        chrom_id: u32,
        start: u32,
        step: u32,
        span: u32,
        values: Vec<f32>,
    },
}

impl Section {
    fn chrom_id(&self) -> u32 {
        match self {
            Section::BedGraph { chrom_id, .. }
            | Section::VariableStep { chrom_id, .. }
            | Section::FixedStep { chrom_id, .. } => *chrom_id,
        }
    }

    fn bounds(&self) -> (u32, u32) {
        match self {
            Section::BedGraph { items, .. } => (
                items.iter().map(|i| i.0).min().unwrap_or(0),
                items.iter().map(|i| i.1).max().unwrap_or(0),
            ),
            Section::VariableStep { span, items, .. } => (
                items.iter().map(|i| i.0).min().unwrap_or(0),
                items.iter().map(|i| i.0 + span).max().unwrap_or(0),
            ),
            Section::FixedStep { start, step, span, values, .. } => {
                let last = start + step * (values.len() as u32).saturating_sub(1);
                (*start, last + span)
            }
        }
    }
}

/// Zoom record as `(chrom_id, start, end, valid_count, sum)`
pub(crate) type ZoomItem = (u32, u32, u32, u32, f32);

struct Buf<B: ByteOrder> {
    bytes: Vec<u8>,
    _order: PhantomData<B>,
}

impl<B: ByteOrder> Buf<B> {
    fn new() -> Self {
        Self { bytes: Vec::new(), _order: PhantomData }
    }

    fn pos(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    fn u16(&mut self, v: u16) {
        let mut tmp = [0u8; 2];
        B::write_u16(&mut tmp, v);
        self.bytes.extend_from_slice(&tmp);
    }

    fn u32(&mut self, v: u32) {
        let mut tmp = [0u8; 4];
        B::write_u32(&mut tmp, v);
        self.bytes.extend_from_slice(&tmp);
    }

    fn u64(&mut self, v: u64) {
        let mut tmp = [0u8; 8];
        B::write_u64(&mut tmp, v);
        self.bytes.extend_from_slice(&tmp);
    }

    fn f32(&mut self, v: f32) {
        let mut tmp = [0u8; 4];
        B::write_f32(&mut tmp, v);
        self.bytes.extend_from_slice(&tmp);
    }

    fn f64(&mut self, v: f64) {
        let mut tmp = [0u8; 8];
        B::write_f64(&mut tmp, v);
        self.bytes.extend_from_slice(&tmp);
    }

    fn zeros(&mut self, n: usize) {
        self.bytes.resize(self.bytes.len() + n, 0);
    }

    fn patch_u16(&mut self, at: u64, v: u16) {
        B::write_u16(&mut self.bytes[at as usize..at as usize + 2], v);
    }

    fn patch_u32(&mut self, at: u64, v: u32) {
        B::write_u32(&mut self.bytes[at as usize..at as usize + 4], v);
    }

    fn patch_u64(&mut self, at: u64, v: u64) {
        B::write_u64(&mut self.bytes[at as usize..at as usize + 8], v);
    }
}

/// A leaf entry of an R-tree: bounds plus the block it points at
struct Block {
    start_chrom: u32,
    start_base: u32,
    end_chrom: u32,
    end_base: u32,
    offset: u64,
    size: u64,
}

/// Builder for small but structurally complete bigWig files
#[derive(Debug, Clone)]
pub(crate) struct BigWigFixture {
    chroms: Vec<(String, u32)>,
    sections: Vec<Section>,
    zooms: Vec<(u32, Vec<ZoomItem>)>,
    compressed: bool,
}

impl BigWigFixture {
    pub(crate) fn new(chroms: &[(&str, u32)]) -> Self {
        Self {
            chroms: chroms.iter().map(|(n, l)| (n.to_string(), *l)).collect(),
            sections: Vec::new(),
            zooms: Vec::new(),
            compressed: false,
        }
    }

    pub(crate) fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub(crate) fn zoom(mut self, reduction: u32, records: Vec<ZoomItem>) -> Self {
        self.zooms.push((reduction, records));
        self
    }

    pub(crate) fn compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        self.write::<LittleEndian>()
    }

    pub(crate) fn build_big_endian(&self) -> Vec<u8> {
        self.write::<BigEndian>()
    }

    fn encode_block(&self, raw: Vec<u8>) -> Vec<u8> {
        if !self.compressed {
            return raw;
        }
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).expect("in-memory zlib write");
        encoder.finish().expect("in-memory zlib finish")
    }

    fn write<B: ByteOrder>(&self) -> Vec<u8> {
        let mut out = Buf::<B>::new();
        let mut max_block = 0usize;

        out.zeros(64);
        out.zeros(24 * self.zooms.len());

        // total summary over bedGraph items
        let summary_offset = out.pos();
        let bed_items: Vec<(u32, u32, f32)> = self
            .sections
            .iter()
            .filter_map(|s| match s {
                Section::BedGraph { items, .. } => Some(items.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        let covered: u64 = bed_items.iter().map(|i| (i.1 - i.0) as u64).sum();
        let min = bed_items.iter().map(|i| i.2 as f64).fold(f64::INFINITY, f64::min);
        let max = bed_items.iter().map(|i| i.2 as f64).fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = bed_items.iter().map(|i| i.2 as f64 * (i.1 - i.0) as f64).sum();
        out.u64(covered);
        out.f64(if bed_items.is_empty() { 0.0 } else { min });
        out.f64(if bed_items.is_empty() { 0.0 } else { max });
        out.f64(sum);
        out.f64(0.0);

        // chromosome tree: an internal root over a single leaf
        let chrom_tree_offset = out.pos();
        let key_size = self.chroms.iter().map(|(n, _)| n.len()).max().unwrap_or(1).max(1);
        out.u32(CHROM_TREE_MAGIC);
        out.u32(self.chroms.len().max(1) as u32);
        out.u32(key_size as u32);
        out.u32(8);
        out.u64(self.chroms.len() as u64);
        out.u64(0);

        let key = |name: &str| {
            let mut k = vec![0u8; key_size];
            k[..name.len()].copy_from_slice(name.as_bytes());
            k
        };

        out.u8(0);
        out.u8(0);
        out.u16(1);
        out.bytes.extend_from_slice(&key(self.chroms.first().map(|c| c.0.as_str()).unwrap_or("")));
        let leaf_pointer = out.pos();
        out.u64(0);

        let leaf_offset = out.pos();
        out.patch_u64(leaf_pointer, leaf_offset);
        out.u8(1);
        out.u8(0);
        out.u16(self.chroms.len() as u16);
        for (id, (name, length)) in self.chroms.iter().enumerate() {
            out.bytes.extend_from_slice(&key(name));
            out.u32(id as u32);
            out.u32(*length);
        }

        // base-pair data, one section per block
        let full_data_offset = out.pos();
        out.u64(self.sections.len() as u64);
        let mut blocks = Vec::new();
        for section in &self.sections {
            let raw = encode_section::<B>(section);
            max_block = max_block.max(raw.len());
            let encoded = self.encode_block(raw);
            let (start, end) = section.bounds();
            blocks.push(Block {
                start_chrom: section.chrom_id(),
                start_base: start,
                end_chrom: section.chrom_id(),
                end_base: end,
                offset: out.pos(),
                size: encoded.len() as u64,
            });
            out.bytes.extend_from_slice(&encoded);
        }

        let full_index_offset = out.pos();
        write_rtree(&mut out, &blocks, true);

        // zoom levels: one block each
        let mut zoom_offsets = Vec::new();
        for (_, records) in &self.zooms {
            let data_offset = out.pos();
            out.u32(records.len() as u32);

            let mut raw = Buf::<B>::new();
            for &(chrom_id, start, end, valid_count, sum) in records {
                let mean = if valid_count == 0 { 0.0 } else { sum / valid_count as f32 };
                raw.u32(chrom_id);
                raw.u32(start);
                raw.u32(end);
                raw.u32(valid_count);
                raw.f32(mean);
                raw.f32(mean);
                raw.f32(sum);
                raw.f32(sum * mean);
            }
            max_block = max_block.max(raw.bytes.len());
            let encoded = self.encode_block(raw.bytes);

            let block = Block {
                start_chrom: records.iter().map(|r| r.0).min().unwrap_or(0),
                start_base: records.iter().map(|r| r.1).min().unwrap_or(0),
                end_chrom: records.iter().map(|r| r.0).max().unwrap_or(0),
                end_base: records.iter().map(|r| r.2).max().unwrap_or(0),
                offset: out.pos(),
                size: encoded.len() as u64,
            };
            out.bytes.extend_from_slice(&encoded);

            let index_offset = out.pos();
            write_rtree(&mut out, &[block], false);
            zoom_offsets.push((data_offset, index_offset));
        }

        // header
        out.patch_u32(0, BIGWIG_MAGIC);
        out.patch_u16(4, 4);
        out.patch_u16(6, self.zooms.len() as u16);
        out.patch_u64(8, chrom_tree_offset);
        out.patch_u64(16, full_data_offset);
        out.patch_u64(24, full_index_offset);
        out.patch_u64(44, summary_offset);
        let uncompress = if self.compressed { max_block.max(1) as u32 } else { 0 };
        out.patch_u32(52, uncompress);

        for (i, ((reduction, _), (data_offset, index_offset))) in
            self.zooms.iter().zip(zoom_offsets).enumerate()
        {
            let at = 64 + 24 * i as u64;
            out.patch_u32(at, *reduction);
            out.patch_u64(at + 8, data_offset);
            out.patch_u64(at + 16, index_offset);
        }

        out.bytes
    }
}

fn encode_section<B: ByteOrder>(section: &Section) -> Vec<u8> {
    let mut raw = Buf::<B>::new();
    let (start, end) = section.bounds();
    raw.u32(section.chrom_id());
    raw.u32(start);
    raw.u32(end);
    match section {
        Section::BedGraph { items, .. } => {
            raw.u32(0);
            raw.u32(0);
            raw.u8(1);
            raw.u8(0);
            raw.u16(items.len() as u16);
            for &(s, e, v) in items {
                raw.u32(s);
                raw.u32(e);
                raw.f32(v);
            }
        }
        Section::VariableStep { span, items, .. } => {
            raw.u32(0);
            raw.u32(*span);
            raw.u8(2);
            raw.u8(0);
            raw.u16(items.len() as u16);
            for &(s, v) in items {
                raw.u32(s);
                raw.f32(v);
            }
        }
        Section::FixedStep { step, span, values, .. } => {
            raw.u32(*step);
            raw.u32(*span);
            raw.u8(3);
            raw.u8(0);
            raw.u16(values.len() as u16);
            for &v in values {
                raw.f32(v);
            }
        }
    }
    raw.bytes
}

/// R-tree with a leaf holding `blocks`, optionally under an internal root
fn write_rtree<B: ByteOrder>(out: &mut Buf<B>, blocks: &[Block], with_root: bool) {
    let start_chrom = blocks.iter().map(|b| b.start_chrom).min().unwrap_or(0);
    let end_chrom = blocks.iter().map(|b| b.end_chrom).max().unwrap_or(0);
    let start_base = blocks
        .iter()
        .filter(|b| b.start_chrom == start_chrom)
        .map(|b| b.start_base)
        .min()
        .unwrap_or(0);
    let end_base = blocks
        .iter()
        .filter(|b| b.end_chrom == end_chrom)
        .map(|b| b.end_base)
        .max()
        .unwrap_or(0);

    out.u32(CIR_TREE_MAGIC);
    out.u32(256);
    out.u64(blocks.len() as u64);
    out.u32(start_chrom);
    out.u32(start_base);
    out.u32(end_chrom);
    out.u32(end_base);
    out.u64(out.pos());
    out.u32(1);
    out.u32(0);

    if with_root {
        out.u8(0);
        out.u8(0);
        out.u16(1);
        out.u32(start_chrom);
        out.u32(start_base);
        out.u32(end_chrom);
        out.u32(end_base);
        let child = out.pos() + 8;
        out.u64(child);
    }

    out.u8(1);
    out.u8(0);
    out.u16(blocks.len() as u16);
    for block in blocks {
        out.u32(block.start_chrom);
        out.u32(block.start_base);
        out.u32(block.end_chrom);
        out.u32(block.end_base);
        out.u64(block.offset);
        out.u64(block.size);
    }
}
