//! Command Encoder
//!
//! Turns a [`LabelDescriptor`] into one TSPL print job. The encoder is a pure
//! function of the descriptor and a [`LabelLayout`]; the default layout is
//! the 4x3 inch finished-product label.

use crate::domain::label::LabelDescriptor;
use crate::domain::tspl::{Alignment, TextFont, TsplWriter};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Encoded job bytes, consumed once by the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuffer(Vec<u8>);

impl CommandBuffer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

const fn at(x: u32, y: u32) -> Point {
    Point { x, y }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaLayout {
    pub width_mm: u32,
    pub height_mm: u32,
    pub gap_mm: u32,
    pub gap_offset_mm: u32,
    pub direction: u8,
    pub density: u8,
}

impl Default for MediaLayout {
    fn default() -> Self {
        Self {
            width_mm: 101,
            height_mm: 76,
            gap_mm: 3,
            gap_offset_mm: 0,
            direction: 1,
            density: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeLayout {
    pub origin: Point,
    pub symbology: String,
    pub height: u32,
    pub human_readable: bool,
    pub rotation: u16,
    pub narrow: u32,
    pub wide: u32,
}

impl Default for BarcodeLayout {
    fn default() -> Self {
        Self {
            // x=60 keeps the left quiet zone off the liner edge.
            origin: at(60, 20),
            symbology: "128".to_string(),
            height: 60,
            human_readable: true,
            rotation: 0,
            narrow: 3,
            wide: 3,
        }
    }
}

/// Horizontal separator rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleLayout {
    pub x: u32,
    pub length: u32,
    pub thickness: u32,
    pub header_y: u32,
    pub product_y: u32,
    pub totals_y: u32,
}

impl Default for RuleLayout {
    fn default() -> Self {
        Self {
            x: 40,
            length: 720,
            thickness: 3,
            header_y: 155,
            product_y: 240,
            totals_y: 515,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    pub header_y: u32,
    pub length_x: u32,
    pub pieces_x: u32,
    pub quantity_x: u32,
    pub first_row_y: u32,
    pub row_step: u32,
    /// Rows start strictly above this offset; later rows are dropped.
    pub row_limit_y: u32,
    pub placeholder: Point,
    pub placeholder_text: String,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            header_y: 260,
            length_x: 60,
            pieces_x: 350,
            quantity_x: 650,
            first_row_y: 295,
            row_step: 35,
            row_limit_y: 510,
            placeholder: at(400, 350),
            placeholder_text: "(Detalle no disponible)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelLayout {
    pub media: MediaLayout,
    pub font: TextFont,
    pub barcode: BarcodeLayout,
    pub lot: Point,
    pub bundle: Point,
    pub product: Point,
    pub dimensions: Point,
    pub rules: RuleLayout,
    pub table: TableLayout,
    pub total_pieces: Point,
    pub total_quantity: Point,
}

impl Default for LabelLayout {
    fn default() -> Self {
        Self {
            media: MediaLayout::default(),
            font: TextFont::default(),
            barcode: BarcodeLayout::default(),
            lot: at(400, 125),
            bundle: at(400, 45),
            product: at(400, 175),
            dimensions: at(400, 210),
            rules: RuleLayout::default(),
            table: TableLayout::default(),
            total_pieces: at(60, 540),
            total_quantity: at(760, 540),
        }
    }
}

/// Shortest decimal form: `8`, `8.5`.
fn plain(value: f64) -> String {
    format!("{}", value)
}

fn fixed(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn encode(label: &LabelDescriptor, layout: &LabelLayout) -> CommandBuffer {
    let unit = label.unit_mode();
    let unit_label = unit.label();
    let rows = label.piece_rows();

    let total_pieces: u64 = rows.iter().map(|r| u64::from(r.piezas)).sum();
    let total_quantity = label.declared_total.unwrap_or_else(|| {
        rows.iter()
            .map(|r| r.quantity(unit, label.ancho))
            .sum::<f64>()
    });

    let font = &layout.font;
    let mut w = TsplWriter::new();

    let media = &layout.media;
    w.size_mm(media.width_mm, media.height_mm);
    w.gap_mm(media.gap_mm, media.gap_offset_mm);
    w.direction(media.direction);
    w.cls();
    w.density(media.density);

    let barcode = &layout.barcode;
    w.barcode(
        barcode.origin.x,
        barcode.origin.y,
        &barcode.symbology,
        barcode.height,
        barcode.human_readable,
        barcode.rotation,
        barcode.narrow,
        barcode.wide,
        &label.fardo_no,
    );

    let center = Some(Alignment::Center);
    w.text(
        layout.lot.x,
        layout.lot.y,
        font,
        center,
        &format!("Lote: {}", label.lote),
    );
    w.text(
        layout.bundle.x,
        layout.bundle.y,
        font,
        center,
        &format!(
            "Fardo: {} - {} {}",
            label.fardo_no,
            fixed(total_quantity),
            unit_label
        ),
    );

    let rules = &layout.rules;
    w.bar(rules.x, rules.header_y, rules.length, rules.thickness);

    w.text(layout.product.x, layout.product.y, font, center, &label.producto);
    w.text(
        layout.dimensions.x,
        layout.dimensions.y,
        font,
        center,
        &format!(
            "{} x {} pulg - {}",
            label.grosor,
            plain(label.ancho),
            label.especie
        ),
    );

    w.bar(rules.x, rules.product_y, rules.length, rules.thickness);

    let table = &layout.table;
    w.text(table.length_x, table.header_y, font, None, "LARGO");
    w.text(table.pieces_x, table.header_y, font, None, "PIEZAS");
    w.text(table.quantity_x, table.header_y, font, None, unit_label);

    if rows.is_empty() {
        w.text(
            table.placeholder.x,
            table.placeholder.y,
            font,
            center,
            &table.placeholder_text,
        );
    } else {
        let mut y = table.first_row_y;
        let mut printed = 0;
        for row in rows.iter() {
            if y >= table.row_limit_y {
                break;
            }
            w.text(table.length_x, y, font, None, &plain(row.largo));
            w.text(table.pieces_x, y, font, None, &row.piezas.to_string());
            w.text(
                table.quantity_x,
                y,
                font,
                None,
                &fixed(row.quantity(unit, label.ancho)),
            );
            y += table.row_step;
            printed += 1;
        }
        if printed < rows.len() {
            debug!(
                "Label {}: {} of {} rows fit, rest dropped",
                label.fardo_no,
                printed,
                rows.len()
            );
        }
    }

    w.bar(rules.x, rules.totals_y, rules.length, rules.thickness);

    let pieces = if total_pieces > 0 {
        total_pieces.to_string()
    } else {
        "-".to_string()
    };
    w.text(
        layout.total_pieces.x,
        layout.total_pieces.y,
        font,
        None,
        &format!("TOTAL PIEZAS: {}", pieces),
    );
    w.text(
        layout.total_quantity.x,
        layout.total_quantity.y,
        font,
        Some(Alignment::Right),
        &format!("TOTAL: {} {}", fixed(total_quantity), unit_label),
    );

    w.print(1, 1);

    CommandBuffer(w.finish())
}

pub fn encode_default(label: &LabelDescriptor) -> CommandBuffer {
    encode(label, &LabelLayout::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::label::PieceRow;

    fn bundle() -> LabelDescriptor {
        LabelDescriptor {
            fardo_no: "F001".to_string(),
            lote: "L5".to_string(),
            producto: "TABLA".to_string(),
            especie: "PINO".to_string(),
            grosor: "1".to_string(),
            ancho: 4.0,
            unidad: Some("m2".to_string()),
            detalles: vec![PieceRow::new(10, 8.0)],
            ..Default::default()
        }
    }

    fn text(buffer: &CommandBuffer) -> String {
        String::from_utf8(buffer.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_finished_product_layout_fixture() {
        let expected = concat!(
            "SIZE 101 mm, 76 mm\r\n",
            "GAP 3 mm, 0 mm\r\n",
            "DIRECTION 1\r\n",
            "CLS\r\n",
            "DENSITY 12\r\n",
            "BARCODE 60,20,\"128\",60,1,0,3,3,\"F001\"\r\n",
            "TEXT 400,125,\"3\",0,1,1,2,\"Lote: L5\"\r\n",
            "TEXT 400,45,\"3\",0,1,1,2,\"Fardo: F001 - 2.48 M2\"\r\n",
            "BAR 40,155,720,3\r\n",
            "TEXT 400,175,\"3\",0,1,1,2,\"TABLA\"\r\n",
            "TEXT 400,210,\"3\",0,1,1,2,\"1 x 4 pulg - PINO\"\r\n",
            "BAR 40,240,720,3\r\n",
            "TEXT 60,260,\"3\",0,1,1,\"LARGO\"\r\n",
            "TEXT 350,260,\"3\",0,1,1,\"PIEZAS\"\r\n",
            "TEXT 650,260,\"3\",0,1,1,\"M2\"\r\n",
            "TEXT 60,295,\"3\",0,1,1,\"8\"\r\n",
            "TEXT 350,295,\"3\",0,1,1,\"10\"\r\n",
            "TEXT 650,295,\"3\",0,1,1,\"2.48\"\r\n",
            "BAR 40,515,720,3\r\n",
            "TEXT 60,540,\"3\",0,1,1,\"TOTAL PIEZAS: 10\"\r\n",
            "TEXT 760,540,\"3\",0,1,1,3,\"TOTAL: 2.48 M2\"\r\n",
            "PRINT 1,1\r\n",
        );
        assert_eq!(text(&encode_default(&bundle())), expected);
    }

    #[test]
    fn test_linear_layout_fixture_rows() {
        let label = LabelDescriptor {
            producto: "MOLDURA".to_string(),
            unidad: None,
            ancho: 12.0,
            ..bundle()
        };
        let out = text(&encode_default(&label));

        assert!(out.contains("TEXT 650,260,\"3\",0,1,1,\"ML\"\r\n"));
        assert!(out.contains("TEXT 650,295,\"3\",0,1,1,\"24.38\"\r\n"));
        assert!(out.contains("TEXT 760,540,\"3\",0,1,1,3,\"TOTAL: 24.38 ML\"\r\n"));
        assert!(out.contains("\"Fardo: F001 - 24.38 ML\""));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let label = bundle();
        assert_eq!(encode_default(&label), encode_default(&label));
    }

    #[test]
    fn test_single_barcode_with_bundle_payload() {
        let out = text(&encode_default(&bundle()));
        assert_eq!(out.matches("BARCODE ").count(), 1);
        assert!(out.contains(",\"F001\"\r\n"));
    }

    #[test]
    fn test_rows_past_safe_area_are_dropped() {
        // Rows land at 295, 330, ... 505; the eighth would start at 540.
        let label = LabelDescriptor {
            detalles: (1..=9).map(|i| PieceRow::new(1, f64::from(i))).collect(),
            ..bundle()
        };
        let out = text(&encode_default(&label));

        for (i, y) in (295..510).step_by(35).enumerate() {
            let expected = format!("TEXT 60,{},\"3\",0,1,1,\"{}\"\r\n", y, i + 1);
            assert!(out.contains(&expected), "missing row {}", i + 1);
        }
        assert!(!out.contains("\"8\"\r\n"));
        assert!(!out.contains("\"9\"\r\n"));
        assert_eq!(out.matches("TEXT 350,").count(), 1 + 7);
        // Totals still cover every row.
        assert!(out.contains("\"TOTAL PIEZAS: 9\""));
    }

    #[test]
    fn test_piece_total_beyond_u32() {
        let label = LabelDescriptor {
            detalles: vec![PieceRow::new(u32::MAX, 8.0), PieceRow::new(1, 8.0)],
            ..bundle()
        };
        let out = text(&encode_default(&label));
        assert!(out.contains("\"TOTAL PIEZAS: 4294967296\""));
    }

    #[test]
    fn test_custom_row_limit() {
        let mut layout = LabelLayout::default();
        layout.table.row_limit_y = 330;
        let label = LabelDescriptor {
            detalles: vec![PieceRow::new(1, 1.0), PieceRow::new(2, 2.0)],
            ..bundle()
        };
        let out = text(&encode(&label, &layout));
        assert!(out.contains("TEXT 350,295,\"3\",0,1,1,\"1\"\r\n"));
        assert!(!out.contains("TEXT 350,330,"));
    }

    #[test]
    fn test_empty_rows_emit_placeholder() {
        let label = LabelDescriptor {
            detalles: Vec::new(),
            ..bundle()
        };
        let out = text(&encode_default(&label));

        assert!(out.contains("TEXT 400,350,\"3\",0,1,1,2,\"(Detalle no disponible)\"\r\n"));
        assert!(!out.contains("TEXT 60,295,"));
        assert!(out.contains("\"TOTAL PIEZAS: -\""));
        assert!(out.contains("\"TOTAL: 0.00 M2\""));
    }

    #[test]
    fn test_declared_total_overrides_sum() {
        let label = LabelDescriptor {
            declared_total: Some(3.1),
            ..bundle()
        };
        let out = text(&encode_default(&label));
        assert!(out.contains("\"Fardo: F001 - 3.10 M2\""));
        assert!(out.contains("\"TOTAL: 3.10 M2\""));
        // Row values are still computed per row.
        assert!(out.contains("TEXT 650,295,\"3\",0,1,1,\"2.48\"\r\n"));
    }

    #[test]
    fn test_recovered_row_is_printed() {
        let label = LabelDescriptor {
            detalles: Vec::new(),
            piezas: Some(10),
            largo: Some(8.0),
            ..bundle()
        };
        assert_eq!(encode_default(&label), encode_default(&bundle()));
    }

    #[test]
    fn test_every_line_is_crlf_terminated() {
        let out = text(&encode_default(&bundle()));
        assert!(out.ends_with("\r\n"));
        assert_eq!(out.matches('\n').count(), out.matches("\r\n").count());
        assert!(out.trim_end().ends_with("PRINT 1,1"));
    }
}
