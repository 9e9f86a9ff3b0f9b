//! Functions that mutate a value and report whether they changed it.

/// Change we can believe in.
///
/// `true` if there has been a change, `false` if not.
pub type Change = bool;

/// Apply a change function to a value as long as the function reports change.
///
/// Return the number of times the function was applied.
///
/// ~~~
/// let mut x = 0;
/// let rounds = truthtree::change::fix(&mut x, |x| {
///     *x = core::cmp::min(*x + 3, 10);
///     *x < 10
/// });
/// assert_eq!((x, rounds), (10, 4));
/// ~~~
pub fn fix<T: ?Sized>(x: &mut T, mut f: impl FnMut(&mut T) -> Change) -> usize {
    let mut rounds = 1;
    while f(x) {
        rounds += 1;
    }
    rounds
}
