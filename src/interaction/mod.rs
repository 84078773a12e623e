//! The interaction state machine and its session context.
//!
//! A [`Session`] owns everything one editing session needs: the image list,
//! the [`AnnotationStore`](crate::store::AnnotationStore), the current
//! [`Transform`](crate::view::Transform), draw mode, the active class, the
//! selection and the in-flight gesture. Shells feed it typed events
//! (`on_pointer_down/move/up/leave`, `on_double_click`, `on_key_down`,
//! `on_wheel`) and act on the returned [`Response`].
//!
//! Image decoding happens outside the session. Every image switch issues a
//! [`LoadTicket`]; a completion carrying an older ticket is ignored.
//!
//! # Example
//!
//! ```
//! use boxlabel::interaction::{PointerEvent, Session};
//! use boxlabel::ir::{ImageSize, ViewportSize};
//!
//! let mut session = Session::default();
//! session.set_viewport(ViewportSize::new(100.0, 200.0));
//! let ticket = session.open_images(["hand.jpg"]).unwrap();
//! assert!(session.complete_load(&ticket, ImageSize::new(100, 200)));
//!
//! session.toggle_draw();
//! session.set_active_class("palma").unwrap();
//! session.on_pointer_down(&PointerEvent::at(10.0, 10.0));
//! session.on_pointer_move(&PointerEvent::at(50.0, 60.0));
//! session.on_pointer_up(&PointerEvent::at(50.0, 60.0));
//!
//! assert_eq!(session.annotation_list(), vec!["0: palma (10,10)-(50,60)"]);
//! ```

mod events;
mod pointer;
mod session;
mod state;

pub use events::{
    Command, Cursor, Handle, KeyEvent, LabelEditRequest, Modifiers, PointerButton, PointerEvent,
    Response, Status, StatusLevel, WheelEvent,
};
pub use session::{LoadTicket, Session};
pub use state::{InteractionState, Mode};
