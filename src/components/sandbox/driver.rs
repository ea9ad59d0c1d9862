use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, MessageEvent, WebSocket, Window};

use crate::control::{
	ConnectionId, ControlView, Controller, Effect, Event, Intent, Snapshot, TimerKind,
};

type Handler<T> = Closure<dyn FnMut(T)>;

struct Socket {
	id: ConnectionId,
	ws: WebSocket,
	_onopen: Handler<web_sys::Event>,
	_onmessage: Handler<MessageEvent>,
	_onclose: Handler<CloseEvent>,
	_onerror: Handler<web_sys::Event>,
}

impl Socket {
	fn detach(&self) {
		self.ws.set_onopen(None);
		self.ws.set_onmessage(None);
		self.ws.set_onclose(None);
		self.ws.set_onerror(None);
	}
}

struct Interval {
	handle: i32,
	callback: Closure<dyn FnMut()>,
}

/// Runs a [`Controller`] inside the browser: owns the `WebSocket`, the interval
/// timers and the JS callbacks feeding events back in.
pub struct BrowserDriver {
	controller: RefCell<Controller>,
	socket: RefCell<Option<Socket>>,
	timers: RefCell<HashMap<TimerKind, Interval>>,
	// cancelled interval callbacks; one may still be on the stack when cancelled
	retired: RefCell<Vec<Closure<dyn FnMut()>>>,
	active: Cell<bool>,
	on_view: Box<dyn Fn(ControlView)>,
}

fn window() -> Window {
	web_sys::window().expect("no global window")
}

impl BrowserDriver {
	pub fn new(controller: Controller, on_view: impl Fn(ControlView) + 'static) -> Rc<Self> {
		Rc::new(Self {
			controller: RefCell::new(controller),
			socket: RefCell::new(None),
			timers: RefCell::new(HashMap::new()),
			retired: RefCell::new(Vec::new()),
			active: Cell::new(true),
			on_view: Box::new(on_view),
		})
	}

	pub fn is_active(&self) -> bool {
		self.active.get()
	}

	pub fn intent(self: &Rc<Self>, intent: Intent) {
		if intent == Intent::Shutdown {
			self.active.set(false);
		} else if intent == Intent::Connect {
			self.active.set(true);
		}
		self.dispatch(Event::Intent(intent));
	}

	pub fn dispatch(self: &Rc<Self>, event: Event) {
		let effects = self.controller.borrow_mut().handle(event);
		for effect in effects {
			self.apply(effect);
		}
		let view = self.controller.borrow().view();
		(self.on_view)(view);
	}

	pub fn with_snapshot<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> R {
		f(self.controller.borrow().snapshot())
	}

	fn apply(self: &Rc<Self>, effect: Effect) {
		match effect {
			Effect::Open { id, endpoint } => self.open(id, &endpoint),
			Effect::Send { id, text } => self.send(id, &text),
			Effect::Close { id } => self.close(id),
			Effect::StartTimer { timer, period_ms } => self.start_timer(timer, period_ms),
			Effect::CancelTimer { timer } => self.cancel_timer(timer),
		}
	}

	fn open(self: &Rc<Self>, id: ConnectionId, endpoint: &str) {
		if let Some(old) = self.socket.borrow_mut().take() {
			old.detach();
		}

		let ws = match WebSocket::new(endpoint) {
			Ok(ws) => ws,
			Err(err) => {
				warn!("socket {id} could not be created: {err:?}");
				self.dispatch(Event::Errored(id));
				return;
			}
		};

		let weak = Rc::downgrade(self);
		let onopen = Closure::<dyn FnMut(web_sys::Event)>::new(move |_| {
			forward(&weak, Event::Opened(id));
		});
		ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));

		let weak = Rc::downgrade(self);
		let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |e: MessageEvent| {
			let data = e.data();
			if let Some(text) = data.as_string() {
				forward(&weak, Event::Message(id, text));
			} else if let Some(buf) = data.dyn_ref::<js_sys::ArrayBuffer>() {
				warn!("ignoring {} byte binary frame on {id}", buf.byte_length());
			} else {
				warn!("ignoring non-text frame on {id}");
			}
		});
		ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

		let weak = Rc::downgrade(self);
		let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |e: CloseEvent| {
			debug!("socket {id} closed with code {}", e.code());
			forward(&weak, Event::Closed(id));
		});
		ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

		let weak = Rc::downgrade(self);
		let onerror = Closure::<dyn FnMut(web_sys::Event)>::new(move |_| {
			forward(&weak, Event::Errored(id));
		});
		ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));

		*self.socket.borrow_mut() = Some(Socket {
			id,
			ws,
			_onopen: onopen,
			_onmessage: onmessage,
			_onclose: onclose,
			_onerror: onerror,
		});
	}

	fn send(&self, id: ConnectionId, text: &str) {
		let socket = self.socket.borrow();
		match socket.as_ref() {
			Some(s) if s.id == id => {
				if let Err(err) = s.ws.send_with_str(text) {
					warn!("send on {id} failed: {err:?}");
				}
			}
			_ => warn!("no socket {id} to send on"),
		}
	}

	fn close(&self, id: ConnectionId) {
		let mut socket = self.socket.borrow_mut();
		if socket.as_ref().is_some_and(|s| s.id == id) {
			if let Some(s) = socket.take() {
				s.detach();
				let _ = s.ws.close();
			}
		}
	}

	fn start_timer(self: &Rc<Self>, timer: TimerKind, period_ms: u32) {
		self.cancel_timer(timer);
		self.retired.borrow_mut().clear();

		let weak = Rc::downgrade(self);
		let callback = Closure::<dyn FnMut()>::new(move || {
			forward(&weak, Event::Tick(timer));
		});
		let handle = match window().set_interval_with_callback_and_timeout_and_arguments_0(
			callback.as_ref().unchecked_ref(),
			period_ms as i32,
		) {
			Ok(handle) => handle,
			Err(err) => {
				warn!("could not start {timer:?} timer: {err:?}");
				return;
			}
		};
		self.timers
			.borrow_mut()
			.insert(timer, Interval { handle, callback });
	}

	fn cancel_timer(&self, timer: TimerKind) {
		if let Some(interval) = self.timers.borrow_mut().remove(&timer) {
			window().clear_interval_with_handle(interval.handle);
			self.retired.borrow_mut().push(interval.callback);
		}
	}
}

fn forward(driver: &Weak<BrowserDriver>, event: Event) {
	if let Some(driver) = driver.upgrade() {
		driver.dispatch(event);
	}
}
