pub const BLOCK_TEMPLATE: &str = "<div class=box><span>hello</span><img src=x></div>";

/// `blocks` copies of [`BLOCK_TEMPLATE`] wrapped in one root element.
pub fn make_blocks(blocks: usize) -> String {
    let mut markup = String::with_capacity(BLOCK_TEMPLATE.len() * blocks + 13);
    markup.push_str("<main>");
    for _ in 0..blocks {
        markup.push_str(BLOCK_TEMPLATE);
    }
    markup.push_str("</main>");
    markup
}

/// A keyed `<ul>` whose items are `0..items` rotated left by `rotate`.
pub fn make_keyed_list(items: usize, rotate: usize) -> String {
    let mut markup = String::with_capacity(items * 32 + 9);
    markup.push_str("<ul>");
    for i in 0..items {
        let n = (i + rotate) % items.max(1);
        markup.push_str(&format!("<li key=\"{n}\">item {n}</li>"));
    }
    markup.push_str("</ul>");
    markup
}
