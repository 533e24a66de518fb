mod entry;
mod game;

fn main() {
	use cadence_util::debug::error::format_anyhow;

	// Initialize the logger
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	color_backtrace::install();

	// Panics inside behavior callbacks are caught and logged by the scheduler already.
	let report_panic = std::panic::take_hook();
	std::panic::set_hook(Box::new(move |info| {
		if !cadence_sched::dispatch::behavior::is_in_guarded_callback() {
			report_panic(info);
		}
	}));

	// Delegate to the inner entry function
	if let Err(err) = entry::main_inner() {
		log::error!("Error during initialization: {}", format_anyhow(&err));
	}
}
