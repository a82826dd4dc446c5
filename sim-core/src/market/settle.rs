// Price-time-priority matching, run once per commodity per turn.

use crate::types::{Price, Quantity, TraderId};

use super::book::OrderBook;
use super::orders::OrderId;

/// One matched parcel: `quantity` units at the seller's ask. The buyer's
/// bid is carried so settlement can refund the bid-ask difference out of
/// the buyer's escrow.
#[derive(Debug, Clone, Copy)]
pub(super) struct MatchFill {
    pub buy_id: OrderId,
    pub sell_id: OrderId,
    pub buyer: TraderId,
    pub seller: TraderId,
    pub quantity: Quantity,
    pub ask: Price,
    pub bid: Price,
}

/// Compute the turn's matches for one book. Pure: order quantities and
/// inventories are untouched; the caller applies the fills as one batch.
///
/// Walks both sides in price-time priority, matching while the best bid
/// meets the best ask. Self-trades are skipped (an entity quoting both
/// sides must not fill against itself).
pub(super) fn match_book(book: &mut OrderBook) -> Vec<MatchFill> {
    book.sort_for_matching();

    let mut fills = Vec::new();
    let mut buy_remaining: Vec<Quantity> = book.buys.iter().map(|o| o.quantity).collect();
    let mut sell_remaining: Vec<Quantity> = book.sells.iter().map(|o| o.quantity).collect();

    let mut bi = 0;
    let mut si = 0;
    while bi < book.buys.len() && si < book.sells.len() {
        if buy_remaining[bi] == 0 {
            bi += 1;
            continue;
        }
        if sell_remaining[si] == 0 {
            si += 1;
            continue;
        }

        let buy = &book.buys[bi];
        let sell = &book.sells[si];
        if buy.price < sell.price {
            break;
        }

        if buy.owner == sell.owner {
            // Skip the self-cross: try the next resting seller for this
            // buyer, falling through once the ask side runs out.
            match next_counterparty(book, si, &sell_remaining, buy.owner, buy.price) {
                Some(alt) => {
                    let qty = buy_remaining[bi].min(sell_remaining[alt]);
                    let sell = &book.sells[alt];
                    fills.push(MatchFill {
                        buy_id: buy.id,
                        sell_id: sell.id,
                        buyer: buy.owner,
                        seller: sell.owner,
                        quantity: qty,
                        ask: sell.price,
                        bid: buy.price,
                    });
                    buy_remaining[bi] -= qty;
                    sell_remaining[alt] -= qty;
                    continue;
                }
                None => {
                    bi += 1;
                    continue;
                }
            }
        }

        let qty = buy_remaining[bi].min(sell_remaining[si]);
        fills.push(MatchFill {
            buy_id: buy.id,
            sell_id: sell.id,
            buyer: buy.owner,
            seller: sell.owner,
            quantity: qty,
            ask: sell.price,
            bid: buy.price,
        });
        buy_remaining[bi] -= qty;
        sell_remaining[si] -= qty;
    }

    fills
}

/// First sell at or below `bid` from `start` onward with stock remaining
/// and a different owner. Only consulted when the head of the ask queue
/// would self-cross.
fn next_counterparty(
    book: &OrderBook,
    start: usize,
    sell_remaining: &[Quantity],
    owner: TraderId,
    bid: Price,
) -> Option<usize> {
    (start + 1..book.sells.len()).find(|&i| {
        let sell = &book.sells[i];
        sell.owner != owner && sell.price <= bid && sell_remaining[i] > 0
    })
}
