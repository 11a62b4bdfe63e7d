//! ASCII analog dial.

use crate::position::{Position, MINUTES_PER_DIAL};
use std::f64::consts::TAU;

const WIDTH: usize = 23;
const HEIGHT: usize = 11;
const CX: f64 = 11.0;
const CY: f64 = 5.0;
// Terminal cells are roughly twice as tall as wide.
const RX: f64 = 10.0;
const RY: f64 = 5.0;

const MINUTE_HAND: char = '+';
const HOUR_HAND: char = '#';

/// Draw a dial showing `pos`, with `title` centered above it.
pub fn render(pos: Position, title: &str) -> Vec<String> {
    let mut grid = vec![vec![' '; WIDTH]; HEIGHT];

    for hour in 1..=12u16 {
        let (x, y) = point(hour as f64 / 12.0, 1.0);
        let label = match hour {
            12 | 3 | 6 | 9 => hour.to_string(),
            _ => ".".to_string(),
        };
        let start = x.saturating_sub(label.len() / 2);
        for (i, c) in label.chars().enumerate() {
            if let Some(cell) = grid[y].get_mut(start + i) {
                *cell = c;
            }
        }
    }

    let minute_turn = pos.minute() as f64 / 60.0;
    let hour_turn = pos.minutes() as f64 / MINUTES_PER_DIAL as f64;
    draw_hand(&mut grid, minute_turn, 0.8, MINUTE_HAND);
    draw_hand(&mut grid, hour_turn, 0.5, HOUR_HAND);
    grid[CY as usize][CX as usize] = 'o';

    let mut lines = Vec::with_capacity(HEIGHT + 1);
    lines.push(format!("{:^width$}", format!("{title} {pos}"), width = WIDTH));
    lines.extend(grid.into_iter().map(|row| row.into_iter().collect::<String>()));
    lines
}

/// Place two rendered dials next to each other.
pub fn side_by_side(left: &[String], right: &[String], gap: usize) -> Vec<String> {
    let width = left.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let rows = left.len().max(right.len());
    (0..rows)
        .map(|i| {
            let l = left.get(i).map(String::as_str).unwrap_or("");
            let r = right.get(i).map(String::as_str).unwrap_or("");
            format!("{l:<width$}{:gap$}{r}", "")
                .trim_end()
                .to_string()
        })
        .collect()
}

/// Grid cell at fraction `turn` of a revolution (0 = 12 o'clock) and
/// `radius` relative to the dial edge.
fn point(turn: f64, radius: f64) -> (usize, usize) {
    let angle = turn * TAU;
    let x = CX + RX * radius * angle.sin();
    let y = CY - RY * radius * angle.cos();
    (
        x.round().clamp(0.0, (WIDTH - 1) as f64) as usize,
        y.round().clamp(0.0, (HEIGHT - 1) as f64) as usize,
    )
}

fn draw_hand(grid: &mut [Vec<char>], turn: f64, length: f64, c: char) {
    let samples = (RX * length).ceil() as usize * 2;
    for i in 1..=samples {
        let (x, y) = point(turn, length * i as f64 / samples as f64);
        grid[y][x] = c;
    }
}
