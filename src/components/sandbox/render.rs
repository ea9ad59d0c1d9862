use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use crate::control::{LinkRect, Snapshot};

// Jet colour map: roots first, then one colour per link collection.
const JET: [&str; 9] = [
	"#00007f", "#0000ff", "#007fff", "#14ffe2", "#7bff7b", "#e2ff14", "#ff9700", "#ff2100",
	"#7f0000",
];

const ALPHA: f64 = 0.7;

pub fn render(snapshot: &Snapshot, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	ctx.clear_rect(0.0, 0.0, width, height);
	ctx.set_global_alpha(ALPHA);
	draw_roots(snapshot, ctx);
	for (group, links) in snapshot.link_groups().enumerate() {
		draw_links(links, JET[(group + 1) % JET.len()], ctx);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_roots(snapshot: &Snapshot, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(JET[0]);
	for c in snapshot.circles().iter().flatten() {
		ctx.begin_path();
		let _ = ctx.arc(c.x, c.y, c.r, 0.0, 2.0 * PI);
		ctx.fill();
	}
}

fn draw_links(links: &[Option<LinkRect>], color: &str, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(color);
	for l in links.iter().flatten() {
		ctx.save();
		let _ = ctx.translate(l.x, l.y);
		let _ = ctx.rotate(l.theta);
		ctx.fill_rect(-l.width / 2.0, -l.height / 2.0, l.width, l.height);
		ctx.restore();
	}
}
