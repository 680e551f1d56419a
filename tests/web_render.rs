#![cfg(target_arch = "wasm32")]

use arcade_dom::{attrs, children, h, DomHost, Error, Node, Renderer};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

use web_setup_::{attached_container, document, init_logging};

fn countdown(seconds: u8) -> Node {
	h("div", attrs! { "class" => "countdown" }, children!["Game starts in ", seconds])
}

#[wasm_bindgen_test]
fn render_then_patch() {
	let mut host = DomHost::new(document());
	let (container, element) = attached_container(&mut host);
	let mut renderer = Renderer::new(host);

	renderer.render(Some(countdown(10)), container).unwrap();
	assert_eq!(element.inner_html(), r#"<div class="countdown">Game starts in 10</div>"#);
	let div = element.first_child().unwrap();
	let seconds = div.last_child().unwrap();

	renderer.render(Some(countdown(9)), container).unwrap();
	assert_eq!(element.inner_html(), r#"<div class="countdown">Game starts in 9</div>"#);
	assert!(div.is_same_node(element.first_child().as_ref()));
	assert!(seconds.is_same_node(div.last_child().as_ref()));
}

#[wasm_bindgen_test]
fn attributes_and_children_follow_the_tree() {
	let mut host = DomHost::new(document());
	let (container, element) = attached_container(&mut host);
	let mut renderer = Renderer::new(host);

	let list = |class: &str, items: &[&str]| {
		h(
			"ul",
			attrs! { "class" => class, "data-count" => items.len() },
			items.iter().map(|item| h("li", attrs! {}, children![*item])).collect::<Vec<_>>(),
		)
	};
	renderer.render(Some(list("players", &["Alice", "Bob", "Carol"])), container).unwrap();
	renderer.render(Some(list("players full", &["Alice", "Carol"])), container).unwrap();
	assert_eq!(
		element.inner_html(),
		r#"<ul class="players full" data-count="2"><li>Alice</li><li>Carol</li></ul>"#
	);
}

#[wasm_bindgen_test]
fn text_is_not_a_container() {
	init_logging();
	let mut host = DomHost::new(document());
	let text = document().create_text_node("score");
	let container = host.adopt(&text);
	let mut renderer = Renderer::new(host);
	assert_eq!(renderer.render(Some(countdown(1)), container), Err(Error::InvalidContainer(container)));
}

#[wasm_bindgen_test]
fn detached_container_keeps_its_content() {
	init_logging();
	let mut host = DomHost::new(document());
	let card = document().create_element("div").unwrap();
	let container = host.adopt(&card);
	let mut renderer = Renderer::new(host);

	renderer.render(Some(countdown(5)), container).unwrap();
	document().body().unwrap().append_child(&card).unwrap();
	assert_eq!(card.inner_html(), r#"<div class="countdown">Game starts in 5</div>"#);

	renderer.render(Some(countdown(4)), container).unwrap();
	assert_eq!(card.child_element_count(), 1);
	assert_eq!(card.inner_html(), r#"<div class="countdown">Game starts in 4</div>"#);
}

#[wasm_bindgen_test]
fn hydrated_markup_is_reused() {
	let mut host = DomHost::new(document());
	let (container, element) = attached_container(&mut host);
	element.set_inner_html(r#"<p class="score">0</p>"#);
	let p = element.first_child().unwrap();

	let mut renderer = Renderer::new(host);
	assert!(renderer.hydrate(container));
	renderer
		.render(Some(h("p", attrs! { "class" => "score" }, children!["100"])), container)
		.unwrap();
	assert!(p.is_same_node(element.first_child().as_ref()));
	assert_eq!(element.inner_html(), r#"<p class="score">100</p>"#);
}
