//! HTML rendering for the cart page.

use std::fmt::Write as _;

use kvcart_commerce::{Cart, CartItem};

/// Render the cart page.
pub fn cart_page(cart: &Cart) -> String {
    let pricing = cart.calculate_pricing();
    let mut html = String::with_capacity(4096);

    html.push_str(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Cart</title>
<style>
body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; }
table { width: 100%; border-collapse: collapse; }
th, td { padding: 0.4rem; border-bottom: 1px solid #ddd; text-align: left; }
.num { text-align: right; }
form { margin-top: 1.5rem; }
</style>
</head>
<body>
"#,
    );
    let _ = writeln!(html, "<h1>Cart <small>{}</small></h1>", escape(cart.id.as_str()));

    if cart.is_empty() {
        html.push_str("<p class=\"empty\">Your cart is empty.</p>\n");
    } else {
        html.push_str(
            "<table>\n<tr><th>Item</th><th class=\"num\">Price</th><th class=\"num\">Qty</th>\
             <th class=\"num\">Discount</th><th class=\"num\">Total</th><th></th></tr>\n",
        );
        for item in &cart.items {
            item_row(&mut html, item);
        }
        html.push_str("</table>\n");
    }

    let _ = writeln!(
        html,
        "<p>Subtotal: {:.2}<br>Overall discount: {}<br><strong>Total: {:.2}</strong></p>",
        pricing.subtotal,
        percent(cart.overall_discount),
        pricing.grand_total
    );
    if pricing.has_discounts() {
        let _ = writeln!(
            html,
            "<p class=\"savings\">You save {:.2} ({:.1}%)</p>",
            pricing.discount_total,
            pricing.discount_percentage()
        );
    }
    html.push_str("<p><a href=\"/clear-cart/\">Clear cart</a></p>\n");

    html.push_str(
        r#"<form method="post" action="/add-item/">
<h2>Add item</h2>
<label>Title <input name="title" required></label>
<label>Price <input name="price" type="number" step="0.01" min="0" required></label>
<label>Quantity <input name="quantity" type="number" min="1" value="1" required></label>
<label>Discount <input name="discount" type="number" step="0.01" min="0" max="1" value="0"></label>
<button type="submit">Add</button>
</form>
<form method="post" action="/apply-overall-discount/">
<h2>Overall discount</h2>
<label>Discount <input name="overall_discount" type="number" step="0.01" min="0" max="1" value="0"></label>
<button type="submit">Apply</button>
</form>
</body>
</html>
"#,
    );
    html
}

fn item_row(html: &mut String, item: &CartItem) {
    // Percent-encoded output is also safe inside an attribute
    let id = urlencoding::encode(item.id.as_str());
    let _ = writeln!(
        html,
        "<tr><td>{title}</td><td class=\"num\">{price:.2}</td>\
         <td class=\"num\"><a href=\"/decrement/{id}/\">-</a> {qty} <a href=\"/increment/{id}/\">+</a></td>\
         <td class=\"num\">{discount}</td><td class=\"num\">{total:.2}</td>\
         <td><a href=\"/remove-item/{id}/\">Remove</a></td></tr>",
        title = escape(&item.title),
        price = item.price,
        qty = item.quantity,
        discount = percent(item.discount),
        total = item.line_total(),
    );
}

fn percent(fraction: f64) -> String {
    format!("{}%", (fraction * 10_000.0).round() / 100.0)
}

/// Escape text for use in HTML content and attribute values.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
