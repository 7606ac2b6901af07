//! Macros

/// Create a thread local variable to track an `i64` counter across worker threads.
///
/// * `$title`     - Descriptive title of the statistic that uses `/` as a separator for categories.
///                  For example: "Paths/Paths regenerated",
/// * `$var`       - An identifier for the thread local variable.
/// * `stats_func` - An identifier for the callback function used by `StatsRegistrar::call_stat_funcs()` to report to
///                  `StatsAccumulator`.
#[macro_export]
macro_rules! stat_counter {
    ($title: expr, $var: ident, $stats_func: ident $(,)?) => {
        thread_local! { pub(crate) static $var: std::cell::RefCell<i64> = std::cell::RefCell::new(0); }

        pub(crate) fn $stats_func(accum: &mut $crate::stats::StatsAccumulator) {
            let val = $var.with(|v| std::mem::take(&mut *v.borrow_mut()));
            accum.report_counter($title, val);
        }
    };
}

/// Create a thread local variable to track memory usage as a counter across worker threads.
///
/// * `$title`     - Descriptive title of the statistic that uses `/` as a separator for categories.
///                  For example: "Memory/Ray state store",
/// * `$var`       - An identifier for the thread local variable.
/// * `stats_func` - An identifier for the callback function used by `StatsRegistrar::call_stat_funcs()` to report to
///                  `StatsAccumulator`.
#[macro_export]
macro_rules! stat_memory_counter {
    ($title: expr, $var: ident, $stats_func: ident $(,)?) => {
        thread_local! { pub(crate) static $var: std::cell::RefCell<u64> = std::cell::RefCell::new(0); }

        pub(crate) fn $stats_func(accum: &mut $crate::stats::StatsAccumulator) {
            let val = $var.with(|v| std::mem::take(&mut *v.borrow_mut()));
            accum.report_memory_counter($title, val);
        }
    };
}

/// Create a thread local variable to track an integer distribution across worker threads.
///
/// * `$title`     - Descriptive title of the statistic that uses `/` as a separator for categories.
///                  For example: "Scheduler/Passes per tile",
/// * `$var`       - An identifier for the thread local variable.
/// * `stats_func` - An identifier for the callback function used by `StatsRegistrar::call_stat_funcs()` to report to
///                  `StatsAccumulator`.
#[macro_export]
macro_rules! stat_int_distribution {
    ($title: expr, $var: ident, $stats_func: ident $(,)?) => {
        thread_local! {
            pub(crate) static $var: std::cell::RefCell<$crate::stats::StatsDistribution<i64>> =
                std::cell::RefCell::new($crate::stats::StatsDistribution::default());
        }

        pub(crate) fn $stats_func(accum: &mut $crate::stats::StatsAccumulator) {
            let val = $var.with(|v| std::mem::take(&mut *v.borrow_mut()));
            accum.report_int_distribution($title, val);
        }
    };
}

/// Create thread local variables to track `i64` values for numerator/denominator as percentage across worker
/// threads.
///
/// * `$title`     - Descriptive title of the statistic that uses `/` as a separator for categories.
///                  For example: "Lanes/Idle lanes",
/// * `$var_num`   - An identifier for the thread local variable for numerator (actual count).
/// * `$var_denom` - An identifier for the thread local variable for denominator (total count).
/// * `stats_func` - An identifier for the callback function used by `StatsRegistrar::call_stat_funcs()` to report to
///                  `StatsAccumulator`.
#[macro_export]
macro_rules! stat_percent {
    ($title: expr, $var_num: ident, $var_denom: ident, $stats_func: ident $(,)?) => {
        thread_local! {
            pub(crate) static $var_num: std::cell::RefCell<i64> = std::cell::RefCell::new(0);
            pub(crate) static $var_denom: std::cell::RefCell<i64> = std::cell::RefCell::new(0);
        }

        pub(crate) fn $stats_func(accum: &mut $crate::stats::StatsAccumulator) {
            let num = $var_num.with(|v| std::mem::take(&mut *v.borrow_mut()));
            let denom = $var_denom.with(|v| std::mem::take(&mut *v.borrow_mut()));
            accum.report_percentage($title, num, denom);
        }
    };
}

/// Create thread local variables to track `i64` values for numerator/denominator as ratio across worker threads.
///
/// * `$title`     - Descriptive title of the statistic that uses `/` as a separator for categories.
///                  For example: "Queues/Queued slots per dispatched slot",
/// * `$var_num`   - An identifier for the thread local variable for numerator.
/// * `$var_denom` - An identifier for the thread local variable for denominator.
/// * `stats_func` - An identifier for the callback function used by `StatsRegistrar::call_stat_funcs()` to report to
///                  `StatsAccumulator`.
#[macro_export]
macro_rules! stat_ratio {
    ($title: expr, $var_num: ident, $var_denom: ident, $stats_func: ident $(,)?) => {
        thread_local! {
            pub(crate) static $var_num: std::cell::RefCell<i64> = std::cell::RefCell::new(0);
            pub(crate) static $var_denom: std::cell::RefCell<i64> = std::cell::RefCell::new(0);
        }

        pub(crate) fn $stats_func(accum: &mut $crate::stats::StatsAccumulator) {
            let num = $var_num.with(|v| std::mem::take(&mut *v.borrow_mut()));
            let denom = $var_denom.with(|v| std::mem::take(&mut *v.borrow_mut()));
            accum.report_ratio($title, num, denom);
        }
    };
}

/// Convenience macro to increment a thread local variable for counter/percent/ratio statistics.
#[macro_export]
macro_rules! stat_inc {
    ($var: ident, $e: expr) => {
        $var.with(|v| *v.borrow_mut() += $e);
    };
}

/// Convenience macro to report a sample to a thread local distribution statistic.
#[macro_export]
macro_rules! stat_dist {
    ($var: ident, $e: expr) => {
        $var.with(|v| v.borrow_mut().report($e));
    };
}

/// Convenience macro to register the callback functions for statistics of a module.
///
/// * `$($func: ident),+` - One or more callback functions created by the `stat_*` macros.
#[macro_export]
macro_rules! stat_register_fns {
    ($($stat_func: ident),+ $(,)?) => {
        /// Register this module's statistics with the global registrar. Cheap to call repeatedly; call it from the
        /// constructor of the module's top-level type.
        pub(crate) fn register_stats() {
            static REGISTERED: std::sync::Once = std::sync::Once::new();
            REGISTERED.call_once(|| {
                let mut sr = $crate::stats::stats_registrar().lock().unwrap();
                $(
                    sr.register_stat_func($stat_func);
                )+
            });
        }
    };
}

/// Fold the calling thread's statistics into the global `StatsAccumulator`. This calls the registered callbacks
/// created with the `stat_*` macros and must be called at the end of each worker thread and by the thread that drives
/// the render.
#[macro_export]
macro_rules! report_stats {
    () => {{
        let mut accum = $crate::stats::stats_accumulator().lock().unwrap();
        $crate::stats::stats_registrar().lock().unwrap().call_stat_funcs(&mut accum);
    }};
}

/// Print the statistics accumulated in the global `StatsAccumulator`.
#[macro_export]
macro_rules! print_stats {
    () => {{
        $crate::stats::stats_accumulator().lock().unwrap().print();
    }};
}

/// Clear the statistics accumulated in the global `StatsAccumulator`.
#[macro_export]
macro_rules! clear_stats {
    () => {{
        $crate::stats::stats_accumulator().lock().unwrap().clear();
    }};
}
