#![cfg(target_arch = "wasm32")]

use arcade_dom::{attrs, children, h, Callback, DomHost, Node, Renderer};
use std::{any::Any, cell::Cell, rc::Rc};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

use web_setup_::{attached_container, click, document, init_logging};

fn counter(clicks: &Rc<Cell<u32>>) -> Callback {
	let clicks = Rc::clone(clicks);
	Callback::new(move |event: &dyn Any| {
		assert!(event.downcast_ref::<web_sys::Event>().is_some(), "Expected an Event payload.");
		clicks.set(clicks.get() + 1)
	})
}

fn button(on_click: Option<&Callback>) -> Node {
	h("button", attrs! { "id" => "test-button", "onclick" => on_click.cloned() }, children!["Place bomb"])
}

#[wasm_bindgen_test]
fn click_is_rebound() {
	let mut host = DomHost::new(document());
	let (container, element) = attached_container(&mut host);
	let mut renderer = Renderer::new(host);

	let first_clicks = Rc::new(Cell::new(0));
	let second_clicks = Rc::new(Cell::new(0));
	let first = counter(&first_clicks);
	let second = counter(&second_clicks);

	renderer.render(Some(button(Some(&first))), container).unwrap();
	let button_element = element.first_element_child().unwrap();
	assert_eq!(first_clicks.get(), 0);
	click(&button_element);
	assert_eq!(first_clicks.get(), 1);

	renderer.render(Some(button(Some(&second))), container).unwrap();
	click(&button_element);
	assert_eq!((first_clicks.get(), second_clicks.get()), (1, 1));

	renderer.render(Some(button(None)), container).unwrap();
	click(&button_element);
	assert_eq!((first_clicks.get(), second_clicks.get()), (1, 1));
}

#[wasm_bindgen_test]
fn removed_button_stops_listening() {
	init_logging();
	let mut host = DomHost::new(document());
	let (container, element) = attached_container(&mut host);
	let mut renderer = Renderer::new(host);

	let clicks = Rc::new(Cell::new(0));
	let on_click = counter(&clicks);
	renderer.render(Some(h("div", attrs! {}, children![button(Some(&on_click))])), container).unwrap();
	let button_element = element.first_element_child().unwrap().first_element_child().unwrap();

	renderer.render(Some(h("div", attrs! {}, children!["Game over"])), container).unwrap();
	click(&button_element);
	assert_eq!(clicks.get(), 0);
}
