use arcade_dom::{attrs, children, h, ArenaHost, Mutation, Node, OutputId, Renderer, Store};
use pretty_assertions::assert_eq;
use std::{cell::RefCell, rc::Rc};

mod arena_setup_;
use arena_setup_::setup;

#[derive(Clone, Debug, Default)]
struct Lobby {
	players: Vec<String>,
	countdown: Option<u8>,
}

fn view(lobby: &Lobby) -> Node {
	h(
		"div",
		attrs! { "class" => "lobby" },
		children![
			h("h2", attrs! {}, children!["Players: ", lobby.players.len(), "/4"]),
			h("ul", attrs! {}, lobby.players.iter().map(|player| h("li", attrs! {}, children![player])).collect::<Vec<_>>()),
			lobby.countdown.map(|seconds| h("p", attrs! { "class" => "countdown" }, children![seconds])),
		],
	)
}

fn connect(store: &Store<Lobby>, renderer: &Rc<RefCell<Renderer<ArenaHost>>>, container: OutputId) {
	store
		.subscribe({
			let renderer = Rc::clone(renderer);
			move |lobby: &Lobby| renderer.borrow_mut().render(Some(view(lobby)), container).unwrap()
		})
		.forget();
}

#[test]
fn store_updates_rerender() {
	let (renderer, container) = setup();
	let renderer = Rc::new(RefCell::new(renderer));
	let store = Store::new(Lobby::default());
	connect(&store, &renderer, container);

	store.update(|lobby| lobby.players.push("Alice".to_owned()));
	assert_eq!(
		renderer.borrow().host().to_html(container),
		r#"<div><div class="lobby"><h2>Players: 1/4</h2><ul><li>Alice</li></ul></div></div>"#
	);

	renderer.borrow_mut().host_mut().take_mutations();
	store.update(|lobby| {
		lobby.players.push("Bob".to_owned());
		lobby.countdown = Some(10);
	});
	let mutations = renderer.borrow_mut().host_mut().take_mutations();
	assert!(!mutations.contains(&Mutation::Clear { container }));
	assert_eq!(
		renderer.borrow().host().to_html(container),
		r#"<div><div class="lobby"><h2>Players: 2/4</h2><ul><li>Alice</li><li>Bob</li></ul><p class="countdown">10</p></div></div>"#
	);
}

#[test]
fn countdown_ticks_patch_one_text_node() {
	let (renderer, container) = setup();
	let renderer = Rc::new(RefCell::new(renderer));
	let store = Store::new(Lobby {
		players: vec!["Alice".to_owned(), "Bob".to_owned()],
		countdown: Some(10),
	});
	connect(&store, &renderer, container);
	store.update(|_| ());
	renderer.borrow_mut().host_mut().take_mutations();

	store.update(|lobby| lobby.countdown = lobby.countdown.map(|seconds| seconds - 1));
	let mutations = renderer.borrow_mut().host_mut().take_mutations();
	assert_eq!(mutations.len(), 1);
	assert!(matches!(&mutations[0], Mutation::SetText { text, .. } if text == "9"));
}
